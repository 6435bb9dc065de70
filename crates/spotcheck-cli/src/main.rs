mod config;

use camino::Utf8PathBuf;
use facet::Facet;
use facet_args as args;
use owo_colors::OwoColorize;
use spotcheck::{Database, Role, RoleMapping};
use spotcheck_config::Config;

/// Grade a SpotifyClone submission against PostgreSQL.
#[derive(Facet, Debug)]
struct Cli {
    /// Show version information
    #[facet(args::named, args::short = 'V')]
    version: bool,

    /// Command to run
    #[facet(default, args::subcommand)]
    command: Option<Commands>,
}

/// Available commands
#[derive(Facet, Debug)]
#[repr(u8)]
enum Commands {
    /// Import the dump and run every check, then drop the schema
    Check {
        /// Submission directory (overrides the config file)
        #[facet(default, args::named)]
        dir: Option<String>,
    },
    /// Recreate the schema and import the dump, leaving it in place
    Import {
        /// Submission directory (overrides the config file)
        #[facet(default, args::named)]
        dir: Option<String>,
    },
    /// Check that a table references another table's primary key once
    Fk {
        /// Referencing table
        #[facet(args::positional)]
        table: String,
        /// Referenced table
        #[facet(args::positional)]
        referenced: String,
    },
    /// Show the primary key of a table
    Pk {
        /// Table to inspect
        #[facet(args::positional)]
        table: String,
    },
    /// List tables and views in the schema, with their mapped roles
    Tables,
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args_ref: Vec<&str> = args.iter().map(|s| s.as_str()).collect();

    let result: Result<Cli, _> = args::from_slice(&args_ref);

    match result {
        Ok(cli) => {
            init_tracing();
            match run(cli).await {
                Ok(true) => {}
                Ok(false) => std::process::exit(1),
                Err(e) => {
                    eprintln!("{} {}", "error:".red().bold(), e);
                    std::process::exit(2);
                }
            }
        }
        Err(err) if err.is_help_request() => {
            print!("{}", err.help_text().unwrap_or(""));
        }
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(2);
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("spotcheck=info")),
        )
        .init();
}

/// Returns whether everything that was checked passed.
async fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    if cli.version {
        println!("spotcheck {}", env!("CARGO_PKG_VERSION"));
        return Ok(true);
    }

    let Some(command) = cli.command else {
        let config = args::HelpConfig {
            program_name: Some("spotcheck".to_string()),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
            ..Default::default()
        };
        print!("{}", args::generate_help::<Cli>(&config));
        return Ok(true);
    };

    let (mut config, config_path) = config::load()?;
    if let Some(path) = &config_path {
        tracing::debug!(%path, "loaded config");
    }

    match command {
        Commands::Check { dir } => {
            override_dir(&mut config, dir);
            let report = spotcheck::grade(&config).await?;
            print!("{}", report.render(true));
            Ok(report.passed())
        }
        Commands::Import { dir } => {
            override_dir(&mut config, dir);
            let submission = spotcheck::suite::Submission::from_config(&config);
            let db = Database::connect(&config.database).await?;
            db.reset_schema().await?;
            db.import(&submission.dump).await?;
            println!(
                "Imported {} into schema {}",
                submission.dump,
                db.schema().bold()
            );
            Ok(true)
        }
        Commands::Fk { table, referenced } => {
            let db = Database::connect(&config.database).await?;
            let verifier = db.verifier();
            let columns = verifier.foreign_key_columns(&table, &referenced).await?;
            let ok = verifier.has_foreign_key(&table, &referenced).await?;
            print_verdict(
                ok,
                &format!(
                    "{table} -> {referenced}: [{}] ({} column(s), exactly one required)",
                    columns.join(", "),
                    columns.len()
                ),
            );
            Ok(ok)
        }
        Commands::Pk { table } => {
            let db = Database::connect(&config.database).await?;
            let verifier = db.verifier();
            let key = verifier.primary_key_columns(&table).await?;
            let composite = verifier.has_composite_primary_key(&table).await?;
            print_verdict(
                composite,
                &format!(
                    "{table}: primary key [{}]{}",
                    key.join(", "),
                    if composite { " (composite)" } else { "" }
                ),
            );
            Ok(composite)
        }
        Commands::Tables => {
            let roles_path =
                Utf8PathBuf::from(config.submission.dir()).join(config.submission.roles());
            let roles = RoleMapping::load(&roles_path).ok();

            let db = Database::connect(&config.database).await?;
            let tables = db.verifier().tables().await?;
            println!("Schema {} ({} tables):", db.schema().bold(), tables.len());
            for table in &tables {
                let mapped: Vec<&str> = match &roles {
                    Some(roles) => Role::ALL
                        .into_iter()
                        .filter(|role| roles.table(*role) == Some(table.as_str()))
                        .map(Role::key)
                        .collect(),
                    None => Vec::new(),
                };
                if mapped.is_empty() {
                    println!("  {table}");
                } else {
                    println!("  {table} {}", format!("[{}]", mapped.join(", ")).dimmed());
                }
            }
            Ok(true)
        }
    }
}

fn override_dir(config: &mut Config, dir: Option<String>) {
    if let Some(dir) = dir {
        config.submission.dir = Some(dir);
    }
}

fn print_verdict(ok: bool, message: &str) {
    if ok {
        println!("{} {}", "✓".green(), message);
    } else {
        println!("{} {}", "✗".red(), message);
    }
}
