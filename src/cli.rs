use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "tidydrop",
    about = "Organizes files dropped into a watched folder",
    version,
    long_about = "TidyDrop organizes a drop folder in one pass: every file is\n\
                  classified by extension, given a cleaned human-readable name,\n\
                  and moved into a category subfolder. Each move is appended to\n\
                  a durable history log.\n\n\
                  Features:\n\
                  • Smart renaming: strips UUIDs, hashes and timestamps\n\
                  • Deterministic collision handling: first free _1, _2, ...\n\
                  • Idempotent: already-organized files are never touched\n\
                  • Durable history: one JSONL record per move\n\
                  • Optional AI descriptions via Gemini (best-effort)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable safe mode (preview only, no changes)
    #[arg(long, global = true)]
    pub safe: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Show detailed help for specific command
    #[arg(long, short = 'H', global = true)]
    pub detailed_help: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Preview a pass: show planned moves without touching anything
    Scan(ScanArgs),

    /// Organize the source folder (classify, rename, move, record)
    Organize(OrganizeArgs),

    /// Organize a single file
    File(FileArgs),

    /// Show recent operations from the history log
    History(HistoryArgs),

    /// Show organization statistics
    Stats(StatsArgs),

    /// Show configuration
    Config,

    /// Show help and examples
    ShowHelp,

    /// Show version information
    Version,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Folder to preview (default: DOWNLOADS_PATH env, then configured root)
    #[arg(env = "DOWNLOADS_PATH")]
    pub path: Option<PathBuf>,

    /// Maximum files to collect
    #[arg(long, default_value_t = 5000)]
    pub limit: usize,
}

#[derive(Args, Debug)]
pub struct OrganizeArgs {
    /// Folder to organize (default: DOWNLOADS_PATH env, then configured root)
    #[arg(env = "DOWNLOADS_PATH")]
    pub path: Option<PathBuf>,

    /// Dry run (show what would be done)
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompts
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Skip AI descriptions for this pass
    #[arg(long)]
    pub no_describe: bool,

    /// Maximum files to process in one pass
    #[arg(long, default_value_t = 5000)]
    pub limit: usize,
}

#[derive(Args, Debug)]
pub struct FileArgs {
    /// File to organize
    pub file: PathBuf,

    /// Skip the AI description for this file
    #[arg(long)]
    pub no_describe: bool,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Number of records to show, newest first
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Folder to inspect (default: DOWNLOADS_PATH env, then configured root)
    #[arg(env = "DOWNLOADS_PATH")]
    pub path: Option<PathBuf>,
}

impl Cli {
    /// Print help with examples
    pub fn print_help() {
        println!("{}", "🗂️  TIDYDROP - DROP FOLDER ORGANIZER".bold().green());
        println!();
        println!("{}", "USAGE:".bold());
        println!("  tidydrop [OPTIONS] <COMMAND>");
        println!();
        println!("{}", "OPTIONS:".bold());
        println!("  --safe           Safe mode (preview only, no changes)");
        println!("  -v, --verbose    Verbose output");
        println!("  --no-color       Disable colored output");
        println!("  -h, --help       Print help");
        println!("  -V, --version    Print version");
        println!();
        println!("{}", "COMMANDS:".bold());
        println!();
        println!("  {}  Preview planned moves", "scan".cyan().bold());
        println!("      tidydrop scan ~/Downloads");
        println!();
        println!("  {}  Organize the source folder", "organize".cyan().bold());
        println!("      tidydrop organize ~/Downloads");
        println!("      tidydrop organize --dry-run");
        println!("      tidydrop organize -y --no-describe");
        println!();
        println!("  {}  Organize a single file", "file".cyan().bold());
        println!("      tidydrop file ~/Downloads/report_a3f29bc1.pdf");
        println!();
        println!("  {}  Show recent operations", "history".cyan().bold());
        println!("      tidydrop history");
        println!("      tidydrop history -n 50");
        println!();
        println!("  {}  Show statistics", "stats".cyan().bold());
        println!("      tidydrop stats");
        println!();
        println!("  {}  Show configuration", "config".cyan().bold());
        println!("      tidydrop config");
        println!();
        println!("{}", "EXAMPLES:".dimmed());
        println!("  # Preview first, then organize");
        println!("  tidydrop scan ~/Downloads");
        println!("  tidydrop organize ~/Downloads");
        println!();
        println!("  # Safe testing");
        println!("  tidydrop --safe organize ~/Downloads");
        println!();
        println!("{}", "DESCRIPTIONS:".bold().cyan());
        println!("  • Set GEMINI_API_KEY to enrich history records");
        println!("  • Without a key, files are still organized normally");
        println!("  • A slow or failing description never blocks a move");
        println!();
        println!("{}", "SAFETY FEATURES:".bold().cyan());
        println!("  • Files are moved, never deleted");
        println!("  • Already-organized files are never touched again");
        println!("  • System paths are refused outright");
        println!("  • Confirmation prompt before a mutating pass");
    }

    /// Print version information
    pub fn print_version() {
        println!("🗂️  TidyDrop v{}", env!("CARGO_PKG_VERSION"));
        println!("Drop folder organizer with durable history");
        println!("Repository: {}", env!("CARGO_PKG_REPOSITORY"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
    }

    /// Print command specific help
    pub fn print_command_help(command: &Commands) {
        let command_name = command.name();

        println!("{} Help for: {}", "ℹ️".cyan(), command_name.bold());
        println!();

        match command {
            Commands::Scan(_) => {
                println!("Preview a pass without touching anything");
                println!();
                println!("Usage: tidydrop scan [PATH] [OPTIONS]");
                println!();
                println!("Arguments:");
                println!("  [PATH]                  Folder to preview (default: DOWNLOADS_PATH, then config)");
                println!();
                println!("Options:");
                println!("  --limit N               Maximum files to collect (default: 5000)");
                println!();
                println!("Examples:");
                println!("  tidydrop scan ~/Downloads");
                println!("  tidydrop scan --limit 100");
            }
            Commands::Organize(_) => {
                println!("Organize the source folder in one pass");
                println!();
                println!("Usage: tidydrop organize [PATH] [OPTIONS]");
                println!();
                println!("Arguments:");
                println!("  [PATH]                  Folder to organize (default: DOWNLOADS_PATH, then config)");
                println!();
                println!("Options:");
                println!("  --dry-run               Show what would be done");
                println!("  -y, --yes               Skip confirmation prompts");
                println!("  --no-describe           Skip AI descriptions for this pass");
                println!("  --limit N               Maximum files per pass (default: 5000)");
                println!();
                println!("Examples:");
                println!("  tidydrop organize ~/Downloads");
                println!("  tidydrop organize --dry-run");
                println!("  tidydrop organize -y --no-describe");
            }
            Commands::File(_) => {
                println!("Organize a single file through the same pipeline");
                println!();
                println!("Usage: tidydrop file <FILE> [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --no-describe           Skip the AI description");
                println!();
                println!("Examples:");
                println!("  tidydrop file ~/Downloads/report_a3f29bc1.pdf");
            }
            Commands::History(_) => {
                println!("Show recent operations from the history log, newest first");
                println!();
                println!("Usage: tidydrop history [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --limit N           Number of records to show (default: 20)");
                println!();
                println!("Examples:");
                println!("  tidydrop history -n 50");
            }
            _ => {
                println!("Run 'tidydrop show-help' for complete usage information");
                println!();
                println!("For detailed help on a specific command, use:");
                println!("  tidydrop {} --detailed-help", command_name);
            }
        }
    }
}

impl Commands {
    /// Get the command name
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Scan(_) => "scan",
            Commands::Organize(_) => "organize",
            Commands::File(_) => "file",
            Commands::History(_) => "history",
            Commands::Stats(_) => "stats",
            Commands::Config => "config",
            Commands::ShowHelp => "help",
            Commands::Version => "version",
        }
    }
}
