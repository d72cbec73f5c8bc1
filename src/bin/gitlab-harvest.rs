#[macro_use]
extern crate log;

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use chrono::Local;
use env_logger::Builder;
use failure::{Error, ResultExt};
use gitlab_harvest::{
    CloneTarget, ClonePolicy, FsSnapshots, GitLabClient, Harvester, Protocol, Scope,
};
use log::LevelFilter;
use sec::Secret;
use structopt::StructOpt;

fn main() {
    let args = Args::from_args();

    if args.example_config {
        if let Err(e) = generate_example() {
            report(&e);
            process::exit(1);
        }
        return;
    }

    if let Err(e) = run(&args) {
        report(&e);
        process::exit(1);
    }
}

fn report(e: &Error) {
    eprintln!("Error: {}", e);

    for cause in e.iter_causes() {
        eprintln!("\tCaused By: {}", cause);
    }
}

fn generate_example() -> Result<(), Error> {
    let example = ClonePolicy::example().as_toml()?;
    println!("{}", example);

    Ok(())
}

fn run(args: &Args) -> Result<(), Error> {
    initialize_logging(args)?;

    let scope = args.scope()?;
    let policy = args.policy(&scope)?;

    if log_enabled!(log::Level::Debug) {
        for line in format!("{:#?}", policy).lines() {
            debug!("{}", line);
        }
    }

    let client = GitLabClient::new(policy.base_url.as_ref().map(|s| s.as_str()), policy.token())?;
    let sink = FsSnapshots::new(policy.meta_dir());
    let targets = Harvester::new(&client, &policy)
        .with_snapshots(&sink)
        .harvest(&scope)?;

    print_targets(&targets, args.plain)?;

    Ok(())
}

fn print_targets(targets: &[CloneTarget], plain: bool) -> Result<(), Error> {
    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    if plain {
        for target in targets {
            writeln!(stdout, "{}\t{}", target.path, target.clone_url)?;
        }
    } else {
        serde_json::to_writer_pretty(&mut stdout, targets)
            .context("Unable to write the clone targets")?;
        writeln!(stdout)?;
    }

    Ok(())
}

#[derive(Debug, Clone, StructOpt)]
#[structopt(about = "Find every repository in a GitLab group or user account.")]
struct Args {
    #[structopt(short = "c", long = "config", help = "A TOML file to read the clone policy from.")]
    config_file: Option<String>,
    #[structopt(
        short = "v",
        long = "verbose",
        parse(from_occurrences),
        help = "Verbose output (repeat for more verbosity)"
    )]
    verbosity: u64,
    #[structopt(long = "example-config", help = "Generate an example config and immediately exit.")]
    example_config: bool,
    #[structopt(
        long = "namespace",
        env = "GITLAB_HARVEST_NAMESPACE",
        help = "Only keep projects under this path (\"unset\" to keep everything)"
    )]
    namespace: Option<String>,
    #[structopt(long = "skip-archived", help = "Ignore archived projects")]
    skip_archived: bool,
    #[structopt(
        long = "protocol",
        env = "GITLAB_HARVEST_PROTOCOL",
        help = "Clone using \"https\" or \"ssh\""
    )]
    protocol: Option<Protocol>,
    #[structopt(
        long = "token",
        env = "GITLAB_TOKEN",
        hide_env_values = true,
        help = "A GitLab personal access token"
    )]
    token: Option<String>,
    #[structopt(
        long = "base-url",
        env = "GITLAB_HARVEST_BASE_URL",
        help = "The API endpoint for a self-hosted GitLab instance"
    )]
    base_url: Option<String>,
    #[structopt(
        short = "o",
        long = "output",
        env = "GITLAB_HARVEST_OUTPUT",
        help = "Where project snapshots are saved"
    )]
    output: Option<String>,
    #[structopt(long = "org-label", help = "The snapshot directory's name (defaults to the group)")]
    org_label: Option<String>,
    #[structopt(long = "plain", help = "Print \"path<TAB>clone-url\" lines instead of JSON")]
    plain: bool,
    #[structopt(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, StructOpt)]
enum Command {
    /// Every project in a group and its subgroups.
    #[structopt(name = "group")]
    Group { path: String },
    /// Every project owned by a user.
    #[structopt(name = "user")]
    User { name: String },
}

impl Args {
    fn scope(&self) -> Result<Scope, Error> {
        match self.command {
            Some(Command::Group { ref path }) => Ok(Scope::Group(path.clone())),
            Some(Command::User { ref name }) => Ok(Scope::User(name.clone())),
            None => Err(failure::err_msg(
                "Nothing to do, please provide either a group or a user",
            )),
        }
    }

    /// Merge the config file (if any) with the command line.
    fn policy(&self, scope: &Scope) -> Result<ClonePolicy, Error> {
        let mut policy = match self.config_file {
            Some(ref config_file) => {
                let config_file =
                    shellexpand::full(config_file).context("Unable to expand wildcards")?;
                ClonePolicy::from_file(&*config_file).context("Couldn't load the config")?
            }
            None => ClonePolicy::default(),
        };

        if let Some(ref namespace) = self.namespace {
            policy.namespace = namespace.clone();
        }
        if self.skip_archived || env_flag("GITLAB_HARVEST_SKIP_ARCHIVED") {
            policy.skip_archived = true;
        }
        if let Some(protocol) = self.protocol {
            policy.protocol = protocol;
        }
        if let Some(ref token) = self.token {
            policy.token = Secret::new(token.clone());
        }
        if let Some(ref base_url) = self.base_url {
            policy.base_url = Some(base_url.clone());
        }
        if let Some(ref output) = self.output {
            let output = shellexpand::full(output).context("Unable to expand wildcards")?;
            policy.output_root = PathBuf::from(&*output);
        }
        if let Some(ref org_label) = self.org_label {
            policy.org_label = org_label.clone();
        }
        if policy.org_label.is_empty() {
            policy.org_label = scope.name().to_string();
        }

        Ok(policy)
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn initialize_logging(args: &Args) -> Result<(), Error> {
    let mut builder = Builder::new();

    let level = match args.verbosity {
        // snapshot failures are only ever reported as warnings
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    builder.filter(Some("gitlab_harvest"), level);

    if let Ok(filter) = env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    }

    builder.format(|out, record| match record.line() {
        Some(line) => writeln!(
            out,
            "{} [{:5}] ({}#{}): {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            line,
            record.args()
        ),
        None => writeln!(
            out,
            "{} [{:5}] ({}): {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            record.args()
        ),
    });

    builder.try_init()?;

    Ok(())
}
