use clap::Parser;
use notekeep::cli::{
    handle_add, handle_delete, handle_edit, handle_init, handle_list, handle_login, handle_logout,
    handle_register, handle_search, handle_shell, Cli, Commands,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays clean for --json output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init {
            url,
            api_key,
            table,
            registration_delay_ms,
        } => handle_init(url, api_key, table, registration_delay_ms),
        Commands::Register {
            first_name,
            last_name,
            email,
        } => handle_register(config, first_name, last_name, email).await,
        Commands::Login { email } => handle_login(config, email).await,
        Commands::Logout => handle_logout(config).await,
        Commands::List { json } => handle_list(config, json).await,
        Commands::Search { query, json } => handle_search(config, query, json).await,
        Commands::Add {
            title,
            content,
            stdin,
        } => handle_add(config, title, content, stdin).await,
        Commands::Edit {
            id,
            title,
            content,
            stdin,
        } => handle_edit(config, id, title, content, stdin).await,
        Commands::Delete { id, force } => handle_delete(config, id, force).await,
        Commands::Shell => handle_shell(config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
