use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "acquaint", about = "Social graph backend")]
pub struct Cli {
    /// Path to a TOML settings file.
    #[arg(long)]
    pub settings: Option<String>,
}
