use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "rustic-files", about = "File manager tool server and CLI")]
pub struct Cli {
    /// TOML config file; defaults are used when omitted.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKeyArg {
    Name,
    Size,
    Modified,
    Created,
    Extension,
}

impl SortKeyArg {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Size => "size",
            Self::Modified => "modified",
            Self::Created => "created",
            Self::Extension => "extension",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortOrderArg {
    Asc,
    Desc,
}

impl SortOrderArg {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    Stdio,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List a directory.
    List {
        path: String,
        #[arg(short, long)]
        recursive: bool,
        #[arg(short, long)]
        group: bool,
        #[arg(long)]
        hidden: bool,
        #[arg(long, value_enum, default_value_t = SortKeyArg::Name)]
        sort_by: SortKeyArg,
        #[arg(long, value_enum, default_value_t = SortOrderArg::Asc)]
        order: SortOrderArg,
    },
    /// Show metadata for a file or directory.
    Stats {
        path: String,
        #[arg(long)]
        hash: bool,
    },
    /// Search by name pattern, content or extension.
    Search {
        path: String,
        #[arg(short = 'p', long)]
        pattern: Option<String>,
        #[arg(short = 'c', long)]
        content: Option<String>,
        #[arg(short = 'e', long)]
        extension: Option<String>,
        #[arg(long)]
        hidden: bool,
        #[arg(long)]
        case_sensitive: bool,
        #[arg(long)]
        max_results: Option<usize>,
    },
    /// Sort a folder's files into per-extension sub-folders.
    Organize {
        path: String,
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        copy: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the tool definitions.
    Tools,
    /// Run the JSON-RPC tool server.
    Serve {
        #[arg(long, value_enum, default_value_t = Transport::Stdio)]
        transport: Transport,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
