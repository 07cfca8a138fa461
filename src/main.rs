use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};

use here_spec::agents::{Assistant, CliLauncher};
use here_spec::config::Config;
use here_spec::llm::{self, SystemInfo};
use here_spec::logging;
use here_spec::projects;
use here_spec::questions::{Question, QuestionSource, TerminalQuestions};
use here_spec::state::StateStore;
use here_spec::steps::{CheckpointEngine, CheckpointError, EngineOptions, StepId, StepLedger};
use here_spec::workflow::{render_status, Workflow};

const PROJECT_NAME_PROMPT: Question =
    Question::new("new_project_name", "🐕 What would you like to name your project?");
const CHOOSE_ASSISTANT: Question = Question::new("assistant", "🤖 Choose your AI assistant:");

const WELCOME: &str = r"
    🐕 Hi! I'm Spec! Let's build something amazing together!

       /^-----^\
      ( ◕     ◕ )
       \  ^___^  /
        \   ---   /
         ^^^     ^^^
";

#[derive(Parser)]
#[command(name = "here-spec")]
#[command(about = "🐕 Progressive checkpoints for Spec-Driven Development")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new project with progressive checkpoints
    Init {
        /// Name of the project directory (asked for when omitted)
        project_name: Option<String>,

        /// Assistant to use (claude or opencode)
        #[arg(short, long)]
        agent: Option<String>,

        /// Use the free tier (opencode)
        #[arg(long)]
        free: bool,

        /// Skip the interviews and use defaults
        #[arg(long)]
        quick: bool,

        /// Accept every checkpoint confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Continue from the last checkpoint
    Continue {
        /// Project directory
        #[arg(default_value = ".")]
        path: String,
    },

    /// Run one checkpoint directly
    Step {
        /// Step name (constitution, spec, plan, tasks, validate, build)
        name: String,

        /// Project directory
        #[arg(long, default_value = ".")]
        path: String,

        /// Record a different assistant for this project
        #[arg(long)]
        agent: Option<String>,
    },

    /// Show progress through the checkpoints
    Status {
        /// Project directory
        #[arg(default_value = ".")]
        path: String,
    },

    /// Check the system for required tools and assistants
    Check,

    /// View or edit preferences
    Config {
        /// Print the effective configuration
        #[arg(long)]
        show: bool,

        /// Delete the user configuration file
        #[arg(long)]
        reset: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;
    let cwd = std::env::current_dir().context("Failed to read current directory")?;

    let logging_handle = logging::init_logging(&config, &log_root(&cli, &cwd), cli.debug)?;

    match cli.command {
        Some(Commands::Init {
            project_name,
            agent,
            free,
            quick,
            yes,
        }) => {
            cmd_init(&config, &cwd, project_name, agent, free, quick, yes)?;
        }
        Some(Commands::Continue { path }) => {
            cmd_continue(&config, &cwd, &path)?;
        }
        Some(Commands::Step { name, path, agent }) => {
            cmd_step(&config, &cwd, &name, &path, agent)?;
        }
        Some(Commands::Status { path }) => {
            cmd_status(&config, &cwd, &path)?;
        }
        Some(Commands::Check) => {
            cmd_check();
        }
        Some(Commands::Config { show, reset }) => {
            cmd_config(&config, show, reset)?;
        }
        None => {
            run_default(&config, &cwd)?;
        }
    }

    if let Some(log_path) = logging_handle.log_file_path {
        if log_path.metadata().map(|m| m.len() > 0).unwrap_or(false) {
            eprintln!("Session log: {}", log_path.display());
        }
    }

    Ok(())
}

/// Project directory whose state dir receives log files
fn log_root(cli: &Cli, cwd: &Path) -> PathBuf {
    match &cli.command {
        Some(Commands::Init {
            project_name: Some(name),
            ..
        }) => cwd.join(name),
        Some(Commands::Continue { path } | Commands::Status { path })
        | Some(Commands::Step { path, .. }) => cwd.join(path),
        _ => cwd.to_path_buf(),
    }
}

/// No subcommand: continue the project here, or start a new one
fn run_default(config: &Config, cwd: &Path) -> Result<()> {
    if projects::is_project(cwd, &config.workflow.state_dir) {
        println!("🐕 Detected project in current directory!");
        cmd_continue(config, cwd, ".")
    } else {
        println!("🐕 Starting new project...\n");
        cmd_init(config, cwd, None, None, false, false, false)
    }
}

fn cmd_init(
    config: &Config,
    cwd: &Path,
    project_name: Option<String>,
    agent: Option<String>,
    free: bool,
    quick: bool,
    auto_confirm: bool,
) -> Result<()> {
    println!("{WELCOME}");

    let mut questions = TerminalQuestions::stdio();
    let name = match project_name {
        Some(name) => name,
        None => questions.ask_text(&PROJECT_NAME_PROMPT, "my-project")?,
    };

    let project_dir = cwd.join(&name);
    std::fs::create_dir_all(&project_dir)
        .with_context(|| format!("Failed to create project directory {}", project_dir.display()))?;
    println!("\n✅ Created project: {name}");
    println!("Location: {}\n", project_dir.display());

    println!("🔍 Checking your system...");
    let info = llm::detect_system();
    print_system_summary(&info);

    let assistant = match agent {
        Some(agent) => match agent.parse::<Assistant>() {
            Ok(assistant) => assistant,
            Err(e) => {
                eprintln!("❌ {e}");
                std::process::exit(1);
            }
        },
        None => select_assistant(config, &info, free, &mut questions)?,
    };

    let mut options = config.engine_options();
    options.auto_confirm |= auto_confirm;
    options.default_project_name.clone_from(&name);

    run_workflow(config, &project_dir, assistant, options, &mut questions, |workflow| {
        workflow.init(&name, assistant, quick)
    })?;
    Ok(())
}

fn cmd_continue(config: &Config, cwd: &Path, path: &str) -> Result<()> {
    let state_dir = &config.workflow.state_dir;
    let project_dir = cwd.join(path);

    if !projects::is_project(&project_dir, state_dir) {
        if path == "." {
            println!("🤔 Hmm, I don't see a project here...");
            let found = projects::discover(cwd, state_dir);
            if found.is_empty() {
                println!("❌ No projects found in current directory.");
                println!("\nTo start a new project:");
                println!("  here-spec init [project-name]");
            } else {
                println!("\nProjects found:");
                for (i, project) in found.iter().enumerate() {
                    println!("  {}. {}", i + 1, project);
                }
                println!("\nTo continue a project:");
                println!("  cd [project-name] && here-spec continue");
                println!("\nOr:");
                println!("  here-spec continue [project-name]");
            }
        } else {
            println!("❌ No project found at: {path}");
            println!("\nTo start a new project:");
            println!("  here-spec init [project-name]");
        }
        std::process::exit(1);
    }

    let store = StateStore::for_project(&project_dir, state_dir);
    let assistant = resolve_assistant(config, &store.load().state.agent);

    let mut questions = TerminalQuestions::stdio();
    run_workflow(
        config,
        &project_dir,
        assistant,
        config.engine_options(),
        &mut questions,
        |workflow| workflow.resume(),
    )?;
    Ok(())
}

fn cmd_step(
    config: &Config,
    cwd: &Path,
    name: &str,
    path: &str,
    agent: Option<String>,
) -> Result<()> {
    if let Err(e) = name.parse::<StepId>() {
        eprintln!("❌ {e}");
        let valid: Vec<&str> = StepLedger::steps().iter().map(|d| d.id.as_str()).collect();
        eprintln!("Valid steps: {}", valid.join(", "));
        std::process::exit(1);
    }

    let project_dir = cwd.join(path);
    let override_agent = agent.map(|a| a.parse::<Assistant>()).transpose()?;
    let assistant = match override_agent {
        Some(assistant) => assistant,
        None => {
            let store = StateStore::for_project(&project_dir, &config.workflow.state_dir);
            resolve_assistant(config, &store.load().state.agent)
        }
    };

    let mut questions = TerminalQuestions::stdio();
    let result = run_workflow(
        config,
        &project_dir,
        assistant,
        config.engine_options(),
        &mut questions,
        |workflow| workflow.run_step(name, override_agent),
    );

    if let Err(err) = result {
        match err.downcast_ref::<CheckpointError>() {
            Some(e @ CheckpointError::NotReady { .. }) => {
                eprintln!("❌ {e}");
                eprintln!("Run 'here-spec continue' to work through the earlier steps first.");
                std::process::exit(1);
            }
            _ => return Err(err),
        }
    }
    Ok(())
}

fn cmd_status(config: &Config, cwd: &Path, path: &str) -> Result<()> {
    let project_dir = cwd.join(path);
    if !projects::is_project(&project_dir, &config.workflow.state_dir) {
        println!("⚠️  No project found");
        return Ok(());
    }

    let loaded = StateStore::for_project(&project_dir, &config.workflow.state_dir).load();
    if let Some(warning) = &loaded.warning {
        println!("⚠️  {warning}");
    }
    render_status(&loaded.state, &mut io::stdout())?;
    Ok(())
}

fn cmd_check() {
    println!("🔍 System Check\n");

    let info = llm::detect_system();
    println!("OS: {}", info.os);
    println!("Git: {}", if info.git { "✅" } else { "❌" });
    println!("Node.js: {}", if info.node { "✅" } else { "❌" });
    println!(
        "Python: {}",
        info.python.as_deref().unwrap_or("Not found")
    );

    println!("\nAI Assistants:");
    for assistant in Assistant::ALL {
        match info.assistants.iter().find(|d| d.assistant == assistant) {
            Some(found) => println!("  ✅ {} ({})", assistant, found.version),
            None => {
                println!("  ❌ {assistant}");
                for line in assistant.install_hint() {
                    println!("     {line}");
                }
            }
        }
    }

    if info.package_managers.is_empty() {
        println!("\nPackage managers: none found");
    } else {
        println!("\nPackage managers: {}", info.package_managers.join(", "));
    }
}

fn cmd_config(config: &Config, show: bool, reset: bool) -> Result<()> {
    if show {
        println!(
            "{}",
            serde_json::to_string_pretty(config).context("Failed to serialize config")?
        );
        if let Some(path) = Config::user_config_path().filter(|p| p.exists()) {
            println!("\nUser config: {}", path.display());
        } else {
            println!("\nNo user configuration found. Using defaults.");
        }
    } else if reset {
        Config::reset_user()?;
        println!("✅ Configuration reset");
    } else {
        let mut edited = config.clone();
        let mut questions = TerminalQuestions::stdio();
        println!("⚙️  Configuration\n");
        if edited.edit(&mut questions)? {
            let path = edited.save_user()?;
            println!("✅ Configuration saved to {}", path.display());
        } else {
            println!("Configuration unchanged");
        }
    }
    Ok(())
}

fn print_system_summary(info: &SystemInfo) {
    let mark = |ok: bool| if ok { "✅" } else { "❌" };
    println!("  {} Git", mark(info.git));
    match &info.python {
        Some(version) => println!("  ✅ {version}"),
        None => println!("  ❌ Python not found"),
    }
    if info.assistants.is_empty() {
        println!("  ⚠️  No AI assistants found");
    } else {
        let names: Vec<&str> = info.assistants.iter().map(|d| d.assistant.as_str()).collect();
        println!("  ✅ AI assistants: {}", names.join(", "));
    }
}

/// `--free` means opencode; otherwise the first installed assistant; otherwise ask
fn select_assistant(
    config: &Config,
    info: &SystemInfo,
    free: bool,
    questions: &mut dyn QuestionSource,
) -> Result<Assistant> {
    if free {
        let assistant = Assistant::Opencode;
        if !info.has_assistant(assistant) {
            println!("\n🆓 Free tier: {}", assistant.display_name());
            for line in assistant.install_hint() {
                println!("  {line}");
            }
        }
        return Ok(assistant);
    }

    if let Some(assistant) = info.recommended_assistant() {
        println!("\n✅ Using {}", assistant.display_name());
        return Ok(assistant);
    }

    let default = config.workflow.default_agent;
    let id = questions.ask_choice(&CHOOSE_ASSISTANT, Assistant::OPTIONS, default.as_str())?;
    Ok(id.parse().unwrap_or(default))
}

/// Assistant recorded in state, falling back to the configured default
fn resolve_assistant(config: &Config, recorded: &str) -> Assistant {
    recorded.parse().unwrap_or_else(|_| {
        tracing::warn!(agent = %recorded, "Unknown assistant in state, using configured default");
        config.workflow.default_agent
    })
}

fn run_workflow<T>(
    config: &Config,
    project_dir: &Path,
    assistant: Assistant,
    options: EngineOptions,
    questions: &mut dyn QuestionSource,
    run: impl FnOnce(&mut Workflow<'_>) -> Result<T>,
) -> Result<T> {
    let state_dir = &config.workflow.state_dir;
    let engine = CheckpointEngine::new(StateStore::for_project(project_dir, state_dir), options);
    let launcher = CliLauncher::new(assistant, state_dir)?;
    let mut stdout = io::stdout();

    let mut workflow = Workflow::new(project_dir, engine, questions, &launcher, &mut stdout)
        .with_celebrations(config.ui.celebrations);
    run(&mut workflow)
}
