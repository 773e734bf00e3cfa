mod cli;

use cli::{Action, GlobalTarget};
use log::debug;
use rgw_ratelimit::AdminClient;

async fn run(action: Action) -> anyhow::Result<()> {
    let client = AdminClient::from_env()?;
    debug!("Running {:?}", action);
    let fetched = match action {
        Action::GetUser(spec) => Some(client.get_user_rate_limit(spec).await?),
        Action::SetUser(spec) => {
            client.set_user_rate_limit(spec).await?;
            None
        }
        Action::GetBucket(spec) => Some(client.get_bucket_rate_limit(spec).await?),
        Action::SetBucket(spec) => {
            client.set_bucket_rate_limit(spec).await?;
            None
        }
        Action::GetGlobal => Some(client.get_global_rate_limit().await?),
        Action::SetGlobal(target, spec) => {
            match target {
                GlobalTarget::User => client.set_global_user_rate_limit(spec).await?,
                GlobalTarget::Bucket => client.set_global_bucket_rate_limit(spec).await?,
                GlobalTarget::Anon => client.set_global_anonymous_rate_limit(spec).await?,
            }
            None
        }
    };
    if let Some(spec) = fetched {
        println!("{}", serde_json::to_string(&spec)?);
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let mut cmd = cli::build_cli();
    let matches = cmd.clone().get_matches();
    let log_level = matches.get_one::<String>("log-level").cloned();
    let version_flag = matches.get_flag("version");

    cli::init_logging(log_level.as_deref());

    if version_flag {
        println!("rgw-ratelimit {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    match cli::action_from_matches(&matches) {
        Some(action) => run(action).await,
        None => {
            cmd.print_help()?;
            Ok(())
        }
    }
}
