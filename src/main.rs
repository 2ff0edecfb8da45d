//! backstage CLI entry point.
//!
//! Parses command-line arguments and dispatches to the appropriate command handler.

use backstage::commands::{
    articles_create_command, articles_delete_command, articles_list_command,
    articles_show_command, articles_update_command, config_display_command, config_reset_command,
    config_set_command, console_command, routes_command,
};
use backstage::completion::{write_completion_script, ShellType, SUPPORTED_SHELLS};
use backstage::config::effective_config;
use backstage::logging;
use backstage::output::print_error;
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "backstage")]
#[command(
    version,
    about = "Tabbed admin console for content managed through a remote HTTP API",
    after_help = "EXAMPLES:
    # Open the interactive console
    backstage

    # Point the console at an API and grant permissions
    backstage config set api_base_url https://admin.example.com/api
    backstage config set permissions /dashboard,/content/article/index

    # Work with articles from scripts
    backstage articles list --field title=release
    backstage articles update 42 --field title=Hello --field content=@body.md"
)]
struct Cli {
    /// Log debug output (to stderr, or to the log file for the console)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive tabbed console (default)
    Console,

    /// Manage articles
    Articles {
        #[command(subcommand)]
        subcommand: ArticlesSubcommand,
    },

    /// Print the menu routes visible to the configured permissions
    Routes,

    /// View or modify configuration
    #[command(after_help = "EXAMPLES:
    backstage config                          # Show the effective file
    backstage config set page_size 50         # Change one value
    backstage config --reset                  # Restore defaults")]
    Config {
        /// Reset the config file to defaults
        #[arg(long)]
        reset: bool,

        #[command(subcommand)]
        subcommand: Option<ConfigSubcommand>,
    },

    /// Output shell completion script
    Completions {
        /// Shell to generate completions for (bash, zsh, fish)
        shell: String,
    },
}

#[derive(Subcommand)]
enum ArticlesSubcommand {
    /// List one page of articles
    List {
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Rows per page (defaults to the configured page size)
        #[arg(long)]
        page_size: Option<u32>,

        /// Search filter as key=value; repeatable
        #[arg(short, long = "field")]
        fields: Vec<String>,
    },

    /// Show one article
    Show { id: String },

    /// Create an article
    Create {
        /// Field as key=value, or key=@path to read the value from a file
        #[arg(short, long = "field")]
        fields: Vec<String>,
    },

    /// Update an article
    Update {
        id: String,

        /// Field as key=value, or key=@path to read the value from a file
        #[arg(short, long = "field")]
        fields: Vec<String>,
    },

    /// Delete an article
    Delete { id: String },
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Set a configuration value
    Set { key: String, value: String },
}

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::Completions { shell }) => match ShellType::from_name(shell) {
            Ok(shell_type) => {
                let mut cmd = Cli::command();
                write_completion_script(shell_type, &mut cmd, &mut std::io::stdout());
                Ok(())
            }
            Err(e) => {
                print_error(&format!(
                    "{}\nSupported shells: {}",
                    e,
                    SUPPORTED_SHELLS.join(", ")
                ));
                std::process::exit(1);
            }
        },

        Some(Commands::Config { reset, subcommand }) => {
            logging::init_cli(cli.verbose);
            match (reset, subcommand) {
                (true, _) => config_reset_command(),
                (false, Some(ConfigSubcommand::Set { key, value })) => {
                    config_set_command(key, value)
                }
                (false, None) => config_display_command(),
            }
        }

        None | Some(Commands::Console) => {
            effective_config().and_then(|config| console_command(&config, cli.verbose))
        }

        Some(Commands::Routes) => {
            logging::init_cli(cli.verbose);
            effective_config().and_then(|config| routes_command(&config))
        }

        Some(Commands::Articles { subcommand }) => {
            logging::init_cli(cli.verbose);
            effective_config().and_then(|config| match subcommand {
                ArticlesSubcommand::List {
                    page,
                    page_size,
                    fields,
                } => articles_list_command(&config, *page, *page_size, fields),
                ArticlesSubcommand::Show { id } => articles_show_command(&config, id),
                ArticlesSubcommand::Create { fields } => articles_create_command(&config, fields),
                ArticlesSubcommand::Update { id, fields } => {
                    articles_update_command(&config, id, fields)
                }
                ArticlesSubcommand::Delete { id } => articles_delete_command(&config, id),
            })
        }
    };

    if let Err(e) = result {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}
