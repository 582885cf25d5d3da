use crate::cli::actions::Action;
use anyhow::Result;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Login {
        api_url: matches
            .get_one("api-url")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --api-url"))?,
        email: matches.get_one("email").map(|s: &String| s.to_string()),
    })
}
