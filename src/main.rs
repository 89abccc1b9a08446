use clap::{Parser, Subcommand};
use log::{debug, error, info};
use olap_cube_store::{
    config::Config, CubeManager, CubeRequest, CubeStoreError, LocalSchemaStore,
};
use serde::Serialize;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::{fs, process};

/// Manage the cube definitions of an OLAP schema document.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Schema document to operate on. Takes precedence over XML_FILE_PATH
    /// and the config file.
    #[arg(global = true, long)]
    xml_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count and list all cubes.
    List,
    /// Print the definition of one cube.
    Get { cube_name: String },
    /// Create a cube from a JSON request ("-" reads stdin).
    Create {
        #[arg(long)]
        request: PathBuf,
    },
    /// Delete a cube.
    Delete { cube_name: String },
    /// Replace a cube with the one described by a JSON request.
    Update {
        cube_name: String,
        #[arg(long)]
        request: PathBuf,
    },
    /// Print the whole schema document.
    Show,
    /// Replace the whole schema document with FILE.
    Replace { file: PathBuf },
}

#[derive(Serialize)]
struct ErrorResponse {
    status_code: u16,
    detail: String,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = Config::new().unwrap_or_else(|e| {
        error!("Failed to initialize config: {}", e);
        process::exit(2);
    });

    let xml_path = cli
        .xml_file
        .clone()
        .unwrap_or_else(|| config.resolve_xml_path());
    info!("XML file path: {}", xml_path.display());

    let manager = CubeManager::new(LocalSchemaStore::new(xml_path))
        .with_update_strategy(config.update_strategy);
    debug!("Update strategy: {}", manager.update_strategy());

    match run(cli.command, &manager) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("{}", e);
            let response = ErrorResponse {
                status_code: e.status_code(),
                detail: e.to_string(),
            };
            match serde_json::to_string_pretty(&response) {
                Ok(body) => eprintln!("{}", body),
                Err(_) => eprintln!("{}", response.detail),
            }
            process::exit(1);
        }
    }
}

fn run(command: Command, manager: &CubeManager<LocalSchemaStore>) -> Result<String, CubeStoreError> {
    match command {
        Command::List => to_json(&manager.enumerate_cubes()?),
        Command::Get { cube_name } => to_json(&manager.get_cube(&cube_name)?),
        Command::Create { request } => to_json(&manager.create_cube(&read_request(&request)?)?),
        Command::Delete { cube_name } => to_json(&manager.delete_cube(&cube_name)?),
        Command::Update { cube_name, request } => {
            to_json(&manager.update_cube(&cube_name, &read_request(&request)?)?)
        }
        Command::Show => manager.document_xml(),
        Command::Replace { file } => {
            let content = fs::read(&file).map_err(|e| CubeStoreError::Read(e.to_string()))?;
            let filename = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            to_json(&manager.replace_document(&filename, &content)?)
        }
    }
}

fn read_request(path: &Path) -> Result<CubeRequest, CubeStoreError> {
    let content = if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| CubeStoreError::Read(e.to_string()))?;
        buffer
    } else {
        fs::read_to_string(path).map_err(|e| CubeStoreError::Read(e.to_string()))?
    };
    serde_json::from_str(&content)
        .map_err(|e| CubeStoreError::Validation(format!("malformed request JSON: {}", e)))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CubeStoreError> {
    serde_json::to_string_pretty(value).map_err(|e| CubeStoreError::Write(e.to_string()))
}
