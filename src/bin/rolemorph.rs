//! CLI for RoleMorph - portrait to medical professional.

use clap::{Args, Parser, Subcommand};
use rolemorph::{
    accept_file, AppController, GeminiModel, GeminiTransformer, PickedFile, Role, Transformer,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rolemorph")]
#[command(about = "Transform a portrait into a medical professional with Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available roles and their prompts
    Roles,

    /// Transform one image and write transformed-image.png
    Transform(TransformArgs),

    /// Interactive session (load, role, generate, download, reset)
    Session(ClientArgs),
}

#[derive(Args)]
struct ClientArgs {
    /// Gemini model identifier
    #[arg(long, default_value = "gemini-2.5-flash-image")]
    model: String,

    /// Seconds to wait for the service before giving up
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    /// API base URL override
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Args)]
struct TransformArgs {
    /// Image to transform (PNG, JPEG or WebP)
    input: PathBuf,

    /// Role to transform into
    #[arg(short, long, default_value = "Doctor")]
    role: Role,

    /// Custom prompt overriding the role's default
    #[arg(long)]
    prompt: Option<String>,

    /// Directory to write transformed-image.png into
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    #[command(flatten)]
    client: ClientArgs,
}

impl ClientArgs {
    fn build(&self) -> anyhow::Result<GeminiTransformer> {
        let mut builder = GeminiTransformer::builder()
            .model(self.model.parse::<GeminiModel>()?)
            .timeout(Duration::from_secs(self.timeout));
        if let Some(ref url) = self.base_url {
            builder = builder.base_url(url);
        }
        Ok(builder.build()?)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("rolemorph={log_level}").into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let result = match cli.command {
        Commands::Roles => list_roles(cli.json),
        Commands::Transform(args) => transform(args, cli.json).await,
        Commands::Session(args) => session(args).await,
    };

    if let Err(err) = result {
        tracing::error!("{err:#}");
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn list_roles(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct RoleInfo {
        name: &'static str,
        prompt: &'static str,
        default: bool,
    }

    let roles: Vec<RoleInfo> = Role::ALL
        .iter()
        .map(|r| RoleInfo {
            name: r.name(),
            prompt: r.default_prompt(),
            default: *r == Role::default(),
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&roles)?);
    } else {
        println!("Available roles:\n");
        for role in &roles {
            let marker = if role.default { " (default)" } else { "" };
            println!("  {}{}", role.name, marker);
            println!("    {}", role.prompt);
        }
    }
    Ok(())
}

async fn transform(args: TransformArgs, json_output: bool) -> anyhow::Result<()> {
    let transformer = args.client.build()?;

    let file = PickedFile::from_path(&args.input)?;
    let Some(source) = accept_file(&file) else {
        anyhow::bail!(
            "{} is not an image ({})",
            args.input.display(),
            file.declared_type
        );
    };

    let mut app = AppController::new();
    app.load_image(source);
    app.select_role(args.role);
    if let Some(prompt) = args.prompt {
        app.set_prompt(prompt);
    }

    let pending = app.begin_generation()?;
    let started = std::time::Instant::now();
    let outcome = tokio::select! {
        outcome = transformer.transform(&pending.image_base64, &pending.mime_type, &pending.prompt) => outcome,
        _ = tokio::signal::ctrl_c() => anyhow::bail!("cancelled"),
    };
    // Keep the upstream detail for the CLI; the controller only keeps the
    // generic message.
    let detail = outcome.as_ref().err().map(|e| e.to_string());
    app.finish_generation(pending.ticket, outcome);

    let Some(result) = app.state().result() else {
        anyhow::bail!(
            "{} ({})",
            app.error().unwrap_or_default(),
            detail.unwrap_or_default()
        );
    };
    let path = result.save_in(&args.output)?;

    if json_output {
        let report = serde_json::json!({
            "success": true,
            "input": args.input.display().to_string(),
            "output": path.display().to_string(),
            "role": app.role().name(),
            "model": transformer.model().as_str(),
            "size_bytes": result.bytes()?.len(),
            "duration_ms": started.elapsed().as_millis() as u64,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Transformed {} into a {} via {}: {}",
            args.input.display(),
            app.role(),
            transformer.name(),
            path.display()
        );
    }
    Ok(())
}

const SESSION_HELP: &str = "\
Commands:
  load <path>       load an image file
  role <name>       select a role (prompt resets to the role's default)
  roles             list roles
  prompt <text>     use a custom prompt
  generate          transform the loaded image (Ctrl-C cancels)
  download [dir]    save transformed-image.png (default: current dir)
  reset             start over
  view              show the current screen
  help              show this help
  quit              leave";

async fn session(args: ClientArgs) -> anyhow::Result<()> {
    let transformer = args.build()?;
    let mut app = AppController::new();

    println!("{SESSION_HELP}\n");
    println!("{}", app.view());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "" => continue,
            "quit" | "exit" => break,
            "help" => println!("{SESSION_HELP}"),
            "view" => {}
            "roles" => list_roles(false)?,
            "load" => match PickedFile::from_path(rest) {
                Ok(file) => match accept_file(&file) {
                    Some(source) => app.load_image(source),
                    None => println!("ignored: {} is not an image", file.name),
                },
                Err(e) => println!("could not read {rest}: {e}"),
            },
            "role" => match rest.parse::<Role>() {
                Ok(role) => app.select_role(role),
                Err(e) => println!("{e}"),
            },
            "prompt" if !rest.is_empty() => app.set_prompt(rest),
            "prompt" => println!("{}", app.prompt()),
            "generate" => run_generation(&mut app, &transformer).await,
            "download" => match app.view().download() {
                Some(download) => {
                    let dir = if rest.is_empty() { "." } else { rest };
                    match download.save_to(dir) {
                        Ok(path) => println!("saved {}", path.display()),
                        Err(e) => println!("could not save: {e}"),
                    }
                }
                None => println!("nothing to download yet"),
            },
            "reset" => app.reset(),
            other => println!("unknown command '{other}', try 'help'"),
        }
        println!("{}", app.view());
    }
    Ok(())
}

async fn run_generation(app: &mut AppController, transformer: &GeminiTransformer) {
    let pending = match app.begin_generation() {
        Ok(pending) => pending,
        Err(e) => {
            tracing::debug!("generate rejected: {e}");
            return;
        }
    };
    println!("{}", app.view());

    tokio::select! {
        outcome = transformer.transform(&pending.image_base64, &pending.mime_type, &pending.prompt) => {
            app.finish_generation(pending.ticket, outcome);
        }
        _ = tokio::signal::ctrl_c() => {
            app.cancel_generation(pending.ticket);
            println!("cancelled");
        }
    }
}
