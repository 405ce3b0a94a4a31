use std::path::PathBuf;

use anyhow::Context;
use dialoguer::theme::ColorfulTheme;
use restcall::api::{Client, Session};
use restcall::config::{ClientConfig, LoginFile};
use restcall::logger;
use serde::Serialize;
use structopt::StructOpt;
use tokio::time::MissedTickBehavior;

const SN: &str = concat!("RESTcall v", env!("CARGO_PKG_VERSION"));

#[derive(Debug, StructOpt)]
#[structopt(name = "restcall", about = "Talk to the OpenTouch REST API")]
struct Opt {
    /// Login file with `ot_external`, `ot_internal`, `username` and `password`
    #[structopt(parse(from_os_str), long = "login", default_value = "login.json")]
    login: PathBuf,

    /// Read the configuration from `OPENTOUCH_*` environment variables instead
    #[structopt(long = "from-env")]
    from_env: bool,

    /// Accept invalid server certificates
    #[structopt(long = "insecure")]
    insecure: bool,

    /// Log debug messages
    #[structopt(short = "v", long = "verbose")]
    verbose: bool,

    #[structopt(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Show details and preferences of the logged in user
    Whoami,
    /// List the logged in users
    Logins,
    /// Place a call
    Call {
        /// Device to call from
        device: String,
        /// Number to call
        callee: String,
        /// Suppress the own number
        #[structopt(long = "anonymous")]
        anonymous: bool,
        /// Accept the callback without ringing the device
        #[structopt(long = "auto-answer")]
        auto_answer: bool,
    },
    /// Answer the call ringing on a device
    Answer { device: String },
    /// Leave the current call
    Drop,
    /// Keep the session alive until ctrl+c
    Watch,
}

async fn prompt_password(username: &str) -> anyhow::Result<String> {
    let prompt = format!("Enter password for `{username}`");
    tokio::task::spawn_blocking(move || {
        dialoguer::Password::with_theme(&ColorfulTheme::default())
            .with_prompt(&prompt)
            .allow_empty_password(false)
            .report(false)
            .interact()
    })
    .await
    .context("password prompt panicked")?
    .context("couldn't read password")
}

async fn load_config(opt: &Opt) -> anyhow::Result<ClientConfig> {
    if opt.from_env {
        return ClientConfig::from_env(SN);
    }

    let login = LoginFile::load(&opt.login)?;
    log::info!("loaded login file {}", opt.login.display());

    let password = match login.password {
        Some(_) => None,
        None => Some(prompt_password(&login.username).await?),
    };
    login.into_config(SN, password.as_deref())
}

fn print_json<T: Serialize>(title: &str, value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("format json")?;
    println!("{}:\n{}", title, text);
    Ok(())
}

async fn watch(client: &Client, session: &Session) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(session.keepalive_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // first tick completes immediately
    interval.tick().await;

    log::info!(
        "sending keepalive every {}s, ctrl+c to stop",
        session.keepalive_interval().as_secs()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("received ctrl+c signal");
                return Ok(());
            }
            _ = interval.tick() => {}
        }

        match client.keepalive(session).await {
            Ok(()) => log::info!("session refreshed"),
            Err(err) if err.ends_session() => return Err(err).context("keepalive"),
            // the next tick might get through
            Err(err) => log::warn!("couldn't refresh session: {}", err),
        }
    }
}

async fn run(client: &Client, session: &Session, command: &Command) -> anyhow::Result<()> {
    match command {
        Command::Whoami => {
            let details = client.my_details(session).await.context("user details")?;
            print_json("User information", &details)?;
            let preferences = client
                .my_preferences(session)
                .await
                .context("user preferences")?;
            print_json("User preferences", &preferences)?;
        }
        Command::Logins => {
            let logins = client.current_logins(session).await.context("logins")?;
            print_json("Logins", &logins)?;
        }
        Command::Call {
            device,
            callee,
            anonymous,
            auto_answer,
        } => {
            let handle = client
                .place_call(session, device, callee, *anonymous, *auto_answer)
                .await
                .context("place call")?;
            log::info!(
                "calling {} from {} (ref: {:?})",
                handle.callee,
                handle.device_id,
                handle.call_ref
            );
        }
        Command::Answer { device } => {
            client
                .answer_call(session, device)
                .await
                .context("answer call")?;
            log::info!("call answered on {}", device);
        }
        Command::Drop => {
            client
                .drop_current_call(session)
                .await
                .context("drop call")?;
            log::info!("call ended");
        }
        Command::Watch => watch(client, session).await?,
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::from_args();
    logger::init(opt.verbose).context("initialize logger")?;

    match dotenv::dotenv() {
        Ok(path) => log::debug!("loaded .env from {}", path.display()),
        Err(err) => log::debug!("couldn't load .env file: {:?}", err),
    };

    let mut config = load_config(&opt).await.context("load configuration")?;
    if opt.insecure {
        config = config.verify_tls(false);
    }

    let client = Client::new(config)?;
    let session = client.authenticate().await.context("authenticate")?;
    print_json("Session information", session.info())?;

    let command = opt.command.unwrap_or(Command::Whoami);
    let result = run(&client, &session, &command).await;

    match client.logout(&session).await {
        Ok(()) => {}
        Err(err) if err.ends_session() => log::info!("session already gone: {}", err),
        Err(err) => log::warn!("couldn't log out: {}", err),
    }

    result
}
