use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use lift::Service;

const CONFIG_FILE_NAME: &str = "serverless.yml";
/// how many parent dirs are searched for the service file.
const MAX_PARENT_DIRS: usize = 4;

#[derive(Parser)]
#[command(name = "lift")]
#[command(about = "CloudFront distributions in front of Lambda function URLs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the service file. Defaults to the closest serverless.yml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the synthesized CloudFormation template
    Synth,
    /// Print the outputs of a construct, read from the deployed stack
    Outputs {
        /// Id of the construct in the service file
        construct: String,
    },
}

/// given a search dir, return the path of the service file in it.
/// If not found, back up 1 dir at a time (limit MAX_PARENT_DIRS times).
fn find_closest_config(mut search_dir: PathBuf) -> Option<PathBuf> {
    for _ in 0..=MAX_PARENT_DIRS {
        search_dir.push(CONFIG_FILE_NAME);
        if search_dir.is_file() {
            return Some(search_dir);
        }
        search_dir.pop();
        if !search_dir.pop() {
            break;
        }
    }
    None
}

fn config_path(config: Option<PathBuf>) -> Result<PathBuf, String> {
    if let Some(path) = config {
        return Ok(path);
    }
    let currdir = std::env::current_dir().map_err(|e| format!("Failed to get current directory\n{e}"))?;
    let path = find_closest_config(currdir.clone()).ok_or_else(|| {
        format!("Failed to find {CONFIG_FILE_NAME} from {:?}. Ensure you are running this from a serverless project", currdir)
    })?;
    log::info!("Using service file {:?}", path);
    Ok(path)
}

fn synth(path: &Path) -> Result<(), String> {
    let service = Service::from_path(path).map_err(|e| e.to_string())?;
    let template = service.synthesize().map_err(|e| e.to_string())?;
    println!("{}", template.to_json_pretty()?);
    Ok(())
}

async fn outputs(path: &Path, construct_id: &str) -> Result<(), String> {
    let service = Service::from_path(path).map_err(|e| e.to_string())?;
    let construct = service.construct(construct_id)
        .ok_or_else(|| format!("Construct '{construct_id}' does not exist in {:?}", path))?;
    let client = aws_cfn_stack::client_for_region(service.provider().region()).await;
    let outputs = construct.outputs(&client).await.map_err(|e| e.to_string())?;
    let out = serde_json::to_string_pretty(&outputs).map_err(|e| format!("Failed to serialize outputs\n{e}"))?;
    println!("{out}");
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let res = match config_path(cli.config) {
        Ok(path) => match cli.command {
            Commands::Synth => synth(&path),
            Commands::Outputs { construct } => outputs(&path, &construct).await,
        },
        Err(e) => Err(e),
    };
    if let Err(e) = res {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_config_in_parent_dirs() {
        let root = std::env::temp_dir().join(format!("lift-cli-test-{}", std::process::id()));
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join(CONFIG_FILE_NAME), "service: my-app\n").unwrap();

        assert_eq!(find_closest_config(nested.clone()), Some(root.join(CONFIG_FILE_NAME)));
        assert_eq!(find_closest_config(root.clone()), Some(root.join(CONFIG_FILE_NAME)));

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn explicit_config_skips_the_search() {
        let path = PathBuf::from("does/not/exist.yml");
        assert_eq!(config_path(Some(path.clone())), Ok(path));
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::parse_from(["lift", "outputs", "api", "--config", "demo.yml"]);
        assert_eq!(cli.config, Some(PathBuf::from("demo.yml")));
        assert!(matches!(cli.command, Commands::Outputs { construct } if construct == "api"));
    }
}
