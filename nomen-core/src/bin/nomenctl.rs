#[cfg(not(feature = "onnx"))]
fn main() {
    eprintln!("nomenctl requires the 'onnx' feature");
    std::process::exit(1);
}

#[cfg(feature = "onnx")]
fn main() {
    if let Err(e) = run() {
        eprintln!("nomenctl failed: {e}");
        std::process::exit(1);
    }
}

#[cfg(feature = "onnx")]
fn run() -> Result<(), String> {
    use nomen_core::{
        EncoderHandle, IdentificationService, OnnxEncoder, OnnxEncoderConfig, ServiceConfig,
        VoiceStore,
    };
    use std::path::PathBuf;

    enum Command {
        Enroll(PathBuf),
        Match(PathBuf),
        Health,
    }

    struct Args {
        command: Command,
        db_path: Option<PathBuf>,
        model_path: Option<PathBuf>,
    }

    fn parse_args() -> Result<Args, String> {
        let mut db_path: Option<PathBuf> = None;
        let mut model_path: Option<PathBuf> = None;
        let mut positional: Vec<String> = Vec::new();

        let mut it = std::env::args().skip(1);
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--db" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --db".into());
                    };
                    db_path = Some(PathBuf::from(v));
                }
                "--model" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --model".into());
                    };
                    model_path = Some(PathBuf::from(v));
                }
                "--help" | "-h" => {
                    println!(
                        "Usage: nomenctl [--db <file>] [--model <file.onnx>] enroll <clip.wav>\n       nomenctl [--db <file>] [--model <file.onnx>] match <clip.wav>\n       nomenctl [--db <file>] health"
                    );
                    std::process::exit(0);
                }
                other if other.starts_with("--") => {
                    return Err(format!("unknown argument: {other}"));
                }
                other => positional.push(other.to_string()),
            }
        }

        let command = match positional.first().map(String::as_str) {
            Some("enroll") => {
                let Some(path) = positional.get(1) else {
                    return Err("enroll requires a clip path".into());
                };
                Command::Enroll(PathBuf::from(path))
            }
            Some("match") => {
                let Some(path) = positional.get(1) else {
                    return Err("match requires a clip path".into());
                };
                Command::Match(PathBuf::from(path))
            }
            Some("health") => Command::Health,
            Some(other) => return Err(format!("unknown command: {other}")),
            None => return Err("no command given (enroll | match | health)".into()),
        };

        Ok(Args {
            command,
            db_path,
            model_path,
        })
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = parse_args()?;

    let mut encoder_config = OnnxEncoderConfig::default();
    if let Some(path) = args.model_path {
        encoder_config.model_path = path;
    }
    let db_path = args.db_path.unwrap_or_else(VoiceStore::default_db_path);

    let store = VoiceStore::new(db_path).map_err(|e| e.to_string())?;
    let encoder = EncoderHandle::new(OnnxEncoder::new(encoder_config));
    let service = IdentificationService::new(ServiceConfig::default(), encoder, store);

    match args.command {
        Command::Health => {
            // Health never touches the audio path or the model weights.
            let report = service.health().map_err(|e| e.to_string())?;
            println!(
                "{}",
                serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?
            );
        }
        Command::Enroll(path) => {
            service.warm_up().map_err(|e| e.to_string())?;
            let bytes = std::fs::read(&path).map_err(|e| e.to_string())?;
            let enrollment = service.enroll(&bytes).map_err(|e| e.to_string())?;
            println!(
                "{}",
                serde_json::to_string_pretty(&enrollment).map_err(|e| e.to_string())?
            );
        }
        Command::Match(path) => {
            service.warm_up().map_err(|e| e.to_string())?;
            let bytes = std::fs::read(&path).map_err(|e| e.to_string())?;
            let result = service.identify(&bytes).map_err(|e| e.to_string())?;
            println!(
                "{}",
                serde_json::to_string_pretty(&result).map_err(|e| e.to_string())?
            );
        }
    }

    Ok(())
}
