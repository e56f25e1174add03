use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "dtz-cli")]
#[command(about = "Command-line client for the DTZ practice proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3001")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the proxy is up
    Health,
    /// Show which credentials and counter store the proxy sees
    Debug,
    /// Submit a letter for correction
    Correct {
        /// Plain-text file holding the letter
        #[arg(short, long)]
        file: PathBuf,
        /// JSON file holding the task (situation, recipient, contentPoints)
        #[arg(short, long)]
        prompt: PathBuf,
        /// formal or informal
        #[arg(short = 't', long = "type", default_value = "formal")]
        letter_type: String,
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Synthesize speech and write the MP3 to disk
    Speak {
        #[arg(short, long)]
        text: String,
        #[arg(short, long)]
        voice: Option<String>,
        #[arg(short, long, default_value = "speech.mp3")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/api/health", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Debug => {
            let res = client.get(format!("{}/api/debug", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Correct {
            file,
            prompt,
            letter_type,
            session,
        } => {
            let text = std::fs::read_to_string(&file)?;
            let prompt: Value = serde_json::from_str(&std::fs::read_to_string(&prompt)?)?;

            let mut body = json!({
                "text": text,
                "prompt": prompt,
                "type": letter_type,
            });
            if let Some(session) = session {
                body["sessionId"] = json!(session);
            }

            let res = client
                .post(format!("{}/api/schreiben/correct", base))
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Speak { text, voice, out } => {
            let mut body = json!({ "text": text });
            if let Some(voice) = voice {
                body["voice"] = json!(voice);
            }

            let res = client.post(format!("{}/api/tts", base)).json(&body).send().await?;
            if !res.status().is_success() {
                return print_response(res).await;
            }

            let audio = res.bytes().await?;
            std::fs::write(&out, &audio)?;
            println!("Wrote {} bytes to {}", audio.len(), out.display());
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: proxy returned status {}", status);
    }

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
