use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use trainercentral_mcp::auth::{default_scope, TokenManager};
use trainercentral_mcp::config::{find_config_file, ConfigFile, Settings};
use trainercentral_mcp::discovery::Discovery;
use trainercentral_mcp::mcp::{envelope_json, McpServer, ToolRegistry};
use trainercentral_mcp::utils::HttpClient;
use trainercentral_mcp::{TrainerCentralApi, TrainerCentralClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// TrainerCentral MCP - manage Zoho TrainerCentral academies from MCP clients
#[derive(Parser, Debug)]
#[command(name = "trainercentral-mcp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MCP server for Zoho TrainerCentral courses, lessons, tests and live workshops", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server (stdio by default)
    Serve {
        /// Run in stdio mode (for MCP clients like Claude Desktop)
        #[arg(long, default_value_t = true)]
        stdio: bool,

        /// Run in streamable HTTP mode (overrides --stdio)
        #[arg(long)]
        http: bool,

        /// Port for HTTP mode
        #[arg(long, short, env = "PORT", default_value_t = 8000)]
        port: u16,

        /// Host to bind to for HTTP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Also serve OAuth discovery metadata and /healthz on this port
        #[arg(long, env = "METADATA_PORT")]
        metadata_port: Option<u16>,
    },

    /// List the available tools
    #[command(alias = "ls")]
    Tools {
        /// Print full input schemas as JSON
        #[arg(long)]
        json: bool,
    },

    /// Invoke a single tool and print its result
    Call {
        /// Tool name, e.g. tc_list_courses
        name: String,

        /// Tool arguments as a JSON object
        #[arg(long = "args", default_value = "{}")]
        arguments: String,
    },

    /// Zoho OAuth helpers
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Subcommand, Debug)]
enum AuthCommands {
    /// Print the consent URL that yields a refreshable authorization code
    Url {
        /// Redirect URI registered for the Zoho client
        #[arg(long)]
        redirect_uri: String,

        /// Comma separated scopes (default: every scope the tools need)
        #[arg(long)]
        scope: Option<String>,

        /// Opaque state echoed back on the redirect
        #[arg(long)]
        state: Option<String>,
    },

    /// Exchange an authorization code for access and refresh tokens
    Exchange {
        /// Code from the consent redirect
        code: String,

        /// Redirect URI used when requesting the code
        #[arg(long)]
        redirect_uri: String,

        /// Scopes requested with the code
        #[arg(long)]
        scope: Option<String>,

        /// Write the refresh token and api domain into this config file
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Refresh the access token now and print the new grant
    Refresh,
}

fn init_tracing(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "error".to_string(),
        (false, 0) => file_log_level(cli.config.as_deref()).unwrap_or_else(|| "info".to_string()),
        (false, 1) => "debug".to_string(),
        _ => "trace".to_string(),
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("trainercentral_mcp={}", level)),
    );

    // stdout carries the MCP protocol in stdio mode
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn file_log_level(config: Option<&Path>) -> Option<String> {
    let path = config.map(Path::to_path_buf).or_else(find_config_file)?;
    ConfigFile::load(&path).ok().map(|c| c.logging.level)
}

fn http_client(settings: &Settings) -> Result<HttpClient> {
    Ok(HttpClient::new(Duration::from_secs(settings.timeout_secs))?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    match cli.command {
        Some(Commands::Serve {
            stdio,
            http,
            port,
            host,
            metadata_port,
        }) => {
            let settings = Settings::load(cli.config.as_deref())?;

            if let Some(metadata_port) = metadata_port {
                let addr: SocketAddr = format!("{}:{}", host, metadata_port)
                    .parse()
                    .with_context(|| format!("invalid metadata address {}:{}", host, metadata_port))?;
                let discovery = Discovery::from_settings(&settings);
                tokio::spawn(async move {
                    if let Err(e) = discovery.serve(addr).await {
                        tracing::error!("Discovery server stopped: {}", e);
                    }
                });
            }

            let client = Arc::new(TrainerCentralClient::new(settings)?);
            let server = McpServer::from_client(client)?;

            // Use HTTP mode if --http flag is provided, otherwise use --stdio flag
            let use_http = http || !stdio;

            if use_http {
                let addr = format!("{}:{}", host, port);
                let (bound_addr, handle) = server.run_http(&addr).await?;
                tracing::info!("MCP server listening on http://{}", bound_addr);

                tokio::select! {
                    result = handle => {
                        result.map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Shutting down");
                    }
                }
            } else {
                server.run().await?;
            }
        }

        Some(Commands::Tools { json }) => {
            // Listing needs no credentials, so skip identity validation
            let settings = Settings::load_unchecked(cli.config.as_deref())?;
            let http = http_client(&settings)?;
            let client = Arc::new(TrainerCentralClient::with_http(settings, http));
            let registry = ToolRegistry::new(&TrainerCentralApi::new(client));

            if json {
                let tools: Vec<_> = registry
                    .all()
                    .into_iter()
                    .map(|t| {
                        serde_json::json!({
                            "name": t.name,
                            "description": t.description,
                            "inputSchema": t.input_schema,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&tools)?);
            } else {
                for tool in registry.all() {
                    println!("{:<48} {}", tool.name, tool.description);
                }
                if !cli.quiet {
                    println!("\n{} tools", registry.len());
                }
            }
        }

        Some(Commands::Call { name, arguments }) => {
            let args: serde_json::Value =
                serde_json::from_str(&arguments).context("--args must be a JSON object")?;
            let settings = Settings::load(cli.config.as_deref())?;
            let client = Arc::new(TrainerCentralClient::new(settings)?);
            let registry = ToolRegistry::new(&TrainerCentralApi::new(client));

            match registry.execute(&name, args).await {
                Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
                Err(e) => {
                    eprintln!("{}", envelope_json(&e));
                    std::process::exit(1);
                }
            }
        }

        Some(Commands::Auth { command }) => {
            let settings = Settings::load_unchecked(cli.config.as_deref())?;
            let tokens = TokenManager::new(&settings, http_client(&settings)?);

            match command {
                AuthCommands::Url {
                    redirect_uri,
                    scope,
                    state,
                } => {
                    let scope = scope.unwrap_or_else(default_scope);
                    println!(
                        "{}",
                        tokens.authorization_url(&redirect_uri, &scope, state.as_deref())?
                    );
                }
                AuthCommands::Exchange {
                    code,
                    redirect_uri,
                    scope,
                    save,
                } => {
                    let grant = tokens
                        .exchange_authorization_code(&code, &redirect_uri, scope.as_deref())
                        .await?;
                    if let Some(path) = save {
                        let mut file = if path.exists() {
                            ConfigFile::load(&path)?
                        } else {
                            ConfigFile::default()
                        };
                        if grant.refresh_token.is_some() {
                            file.zoho.refresh_token = grant.refresh_token.clone();
                        }
                        if grant.api_domain.is_some() {
                            file.zoho.api_domain = grant.api_domain.clone();
                        }
                        file.save(&path)?;
                        tracing::info!("Saved tokens to {}", path.display());
                    }
                    println!("{}", serde_json::to_string_pretty(&grant)?);
                }
                AuthCommands::Refresh => {
                    let grant = tokens.refresh_now().await?;
                    println!("{}", serde_json::to_string_pretty(&grant)?);
                }
            }
        }

        None => {
            println!("trainercentral-mcp v{}", env!("CARGO_PKG_VERSION"));
            println!("Run with --help for available commands, or `serve` to start the MCP server");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["trainercentral-mcp"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert!(!cli.log_json);
        assert!(cli.config.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["trainercentral-mcp", "-vv", "tools"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Some(Commands::Tools { json: false })));
    }

    #[test]
    fn test_cli_serve_http_mode() {
        let cli = Cli::parse_from([
            "trainercentral-mcp",
            "serve",
            "--http",
            "--port",
            "9100",
            "--metadata-port",
            "9101",
        ]);
        match cli.command {
            Some(Commands::Serve {
                stdio,
                http,
                port,
                host,
                metadata_port,
            }) => {
                assert!(stdio);
                assert!(http);
                assert_eq!(port, 9100);
                assert_eq!(host, "127.0.0.1");
                assert_eq!(metadata_port, Some(9101));
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_call_args() {
        let cli = Cli::parse_from([
            "trainercentral-mcp",
            "call",
            "tc_get_course",
            "--args",
            r#"{"course_id":"42"}"#,
        ]);
        match cli.command {
            Some(Commands::Call { name, arguments }) => {
                assert_eq!(name, "tc_get_course");
                assert_eq!(arguments, r#"{"course_id":"42"}"#);
            }
            _ => panic!("Expected Call command"),
        }

        let cli = Cli::parse_from(["trainercentral-mcp", "call", "tc_list_courses"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Call { ref arguments, .. }) if arguments == "{}"
        ));
    }

    #[test]
    fn test_cli_auth_commands() {
        let cli = Cli::parse_from([
            "trainercentral-mcp",
            "--config",
            "tc.toml",
            "auth",
            "exchange",
            "1000.code",
            "--redirect-uri",
            "http://localhost/cb",
            "--save",
            "tc.toml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("tc.toml")));
        match cli.command {
            Some(Commands::Auth {
                command:
                    AuthCommands::Exchange {
                        code,
                        redirect_uri,
                        scope,
                        save,
                    },
            }) => {
                assert_eq!(code, "1000.code");
                assert_eq!(redirect_uri, "http://localhost/cb");
                assert!(scope.is_none());
                assert_eq!(save, Some(PathBuf::from("tc.toml")));
            }
            _ => panic!("Expected auth exchange"),
        }

        let cli = Cli::parse_from(["trainercentral-mcp", "auth", "refresh"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Auth {
                command: AuthCommands::Refresh
            })
        ));
    }

    #[test]
    fn test_file_log_level_reads_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tc.toml");
        std::fs::write(&path, "[logging]\nlevel = \"warn\"\n").unwrap();
        assert_eq!(file_log_level(Some(&path)).as_deref(), Some("warn"));
    }
}
