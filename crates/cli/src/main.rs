use clap::{Args, Parser, Subcommand};
use mrisk_core::constants::REFERENCE_FILE_ENV;
use mrisk_core::validation::{validate_condition_ids, validate_vitals};
use mrisk_core::{
    reference_file_from_env_value, resolve_reference_data, CoreConfig, RiskService,
    VitalsPayload,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mrisk")]
#[command(about = "Obstetric risk classification CLI")]
struct Cli {
    /// Reference data YAML (defaults to $MRISK_REFERENCE_FILE, then the seeded data)
    #[arg(long, global = true)]
    reference: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the risk category for one set of readings
    Classify {
        #[command(flatten)]
        vitals: VitalsArgs,
        /// Pre-existing condition ids (first admission only)
        #[arg(long = "condition", value_name = "ID")]
        conditions: Vec<i64>,
        /// Category currently on the admission; omit for a first admission
        #[arg(long)]
        current: Option<i64>,
        /// Print the full assessment as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the risk categories
    Categories,
    /// List the pathological condition vocabulary
    Conditions,
    /// Load and validate reference data, then report what it contains
    CheckReference,
}

#[derive(Args, Debug, Default)]
struct VitalsArgs {
    /// Systolic blood pressure (mmHg)
    #[arg(long)]
    systolic: Option<i32>,
    /// Diastolic blood pressure (mmHg)
    #[arg(long)]
    diastolic: Option<i32>,
    /// Maternal heart rate (bpm)
    #[arg(long)]
    heart_rate: Option<i32>,
    /// Temperature (°C)
    #[arg(long)]
    temperature: Option<f64>,
    /// Respiratory rate (breaths/min)
    #[arg(long)]
    respiratory_rate: Option<i32>,
    /// Fetal heart rate (bpm)
    #[arg(long)]
    fetal_heart_rate: Option<i32>,
    /// Whether fetal movements were perceived
    #[arg(long)]
    fetal_movements: Option<bool>,
    /// Uterine height (cm)
    #[arg(long)]
    uterine_height: Option<f64>,
}

impl From<VitalsArgs> for VitalsPayload {
    fn from(args: VitalsArgs) -> Self {
        Self {
            systolic_bp: args.systolic,
            diastolic_bp: args.diastolic,
            heart_rate: args.heart_rate,
            temperature: args.temperature,
            respiratory_rate: args.respiratory_rate,
            fetal_heart_rate: args.fetal_heart_rate,
            fetal_movements_present: args.fetal_movements,
            uterine_height: args.uterine_height,
            maternity_evolution: None,
            fetal_assessment: None,
        }
    }
}

fn load_config(reference: Option<PathBuf>) -> Result<CoreConfig, Box<dyn std::error::Error>> {
    let reference = reference
        .or_else(|| reference_file_from_env_value(std::env::var(REFERENCE_FILE_ENV).ok()));
    Ok(CoreConfig::new(resolve_reference_data(reference)?))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Classify {
            vitals,
            conditions,
            current,
            json,
        }) => {
            let cfg = load_config(cli.reference)?;
            let service = RiskService::new(&cfg);
            let vitals = VitalsPayload::from(vitals);
            validate_vitals(&vitals)?;
            validate_condition_ids(&conditions)?;

            let assessment = service.assess(&vitals, &conditions, current)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&assessment)?);
            } else {
                let category = service.registry().lookup(assessment.category_id)?;
                println!(
                    "Category: {} ({}, id {})",
                    category.name, category.key, category.id
                );
                if assessment.sticky_preserved {
                    println!("Sticky category preserved; readings were not evaluated.");
                }
                for contribution in &assessment.contributions {
                    println!("  {} -> {}", contribution.detail(), contribution.level());
                }
            }
        }
        Some(Commands::Categories) => {
            let cfg = load_config(cli.reference)?;
            for category in cfg.reference().registry().iter() {
                println!(
                    "ID: {}, Key: {}, Name: {}, Color: {}",
                    category.id, category.key, category.name, category.color
                );
            }
        }
        Some(Commands::Conditions) => {
            let cfg = load_config(cli.reference)?;
            let vocabulary = cfg.reference().vocabulary();
            if vocabulary.is_empty() {
                println!("No conditions configured.");
            }
            for condition in vocabulary.iter() {
                println!(
                    "ID: {}, Name: {}, Bias: {}",
                    condition.id, condition.name, condition.bias
                );
            }
        }
        Some(Commands::CheckReference) => match load_config(cli.reference) {
            Ok(cfg) => {
                let reference = cfg.reference();
                println!(
                    "Reference data OK ({}): {} categories, {} conditions, {} threshold rules",
                    reference.source(),
                    reference.registry().len(),
                    reference.vocabulary().len(),
                    reference.rules().thresholds().len()
                );
            }
            Err(e) => {
                eprintln!("Invalid reference data: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            println!("Use 'mrisk --help' for commands");
        }
    }

    Ok(())
}
