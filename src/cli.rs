use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "yoga-master-api")]
#[command(about = "Yoga Master API - class marketplace backend")]
#[command(version)]
pub struct Cli {
    #[arg(long, env = "PORT", default_value_t = 5000, help = "Port to listen on")]
    pub port: u16,

    #[arg(long, env = "HOST", default_value = "0.0.0.0", help = "Address to bind")]
    pub host: String,

    #[arg(long, help = "Keep documents in memory instead of Postgres (data is lost on exit)")]
    pub memory: bool,
}
