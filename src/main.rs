mod cache;
mod config;
mod http;
mod ip;
mod retry;
mod services;
mod sync;
mod updater;
mod util;

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::{error, info};

use cache::{IpCache, CACHE_FILE_NAME};
use config::ApiConfig;
use retry::{retry, RetryPolicy};
use sync::{RecordTarget, WILDCARD};
use updater::{Outcome, UpdateRequest};

#[derive(Parser, Debug)]
#[command(name = "porkbun-ddns", version)]
#[command(about = "Points a Porkbun A record at your current public IP address")]
struct Args {
    /// Root domain whose DNS record you would like to update
    root_domain: String,

    /// Update a subdomain instead of the root domain
    #[arg(short, long)]
    subdomain: Option<String>,

    /// Create/update a wildcard record, the same as --subdomain "*"
    #[arg(short, long, conflicts_with = "subdomain")]
    wildcard: bool,

    /// Use this IP address instead of asking Porkbun for it
    #[arg(short, long)]
    ip: Option<String>,

    /// Only update the DNS records if the IP address has changed
    #[arg(short, long)]
    cache_ip: bool,

    /// Configuration file [default: config.json next to the executable, then ./config.json]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where the last published IP is kept [default: ip.txt next to the executable]
    #[arg(long)]
    cache_file: Option<PathBuf>,

    /// Attempts per remote step, 0 retries forever
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Seconds to wait between attempts
    #[arg(long, default_value_t = 3)]
    retry_delay: u64,
}

impl Args {
    fn subdomain(&self) -> Option<&str> {
        if self.wildcard {
            Some(WILDCARD)
        } else {
            self.subdomain.as_deref()
        }
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: NonZeroU32::new(self.retries),
            delay: Duration::from_secs(self.retry_delay),
        }
    }

    fn cache_path(&self) -> PathBuf {
        match &self.cache_file {
            Some(path) => path.clone(),
            None => config::install_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(CACHE_FILE_NAME),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let candidates = match &args.config {
        Some(path) => vec![path.clone()],
        None => config::default_config_paths(),
    };

    let (config_path, api_config) = match ApiConfig::load(&candidates) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("Loaded configuration from {}", config_path.display());

    let policy = args.retry_policy();
    let mut api = services::porkbun::Service::from(api_config);

    let ip = match retry("fetch the public IP", &policy, || {
        ip::resolve_ip(args.ip.as_deref(), &mut api)
    }) {
        Ok(ip) => ip,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let request = UpdateRequest {
        target: RecordTarget::new(&args.root_domain, args.subdomain()),
        ip,
        cache_mode: args.cache_ip,
    };
    let cache = IpCache::new(args.cache_path());

    match updater::update(&mut api, &cache, &policy, &request) {
        Ok(Outcome::Unchanged) => ExitCode::SUCCESS,

        Ok(Outcome::Published(response)) => {
            println!("{}", response.body);
            ExitCode::SUCCESS
        }

        Ok(Outcome::Rejected(response)) => {
            println!("{}", response.body);
            error!(
                "Porkbun did not create the record for {}, the cached IP was left untouched",
                request.target.fqdn()
            );
            ExitCode::FAILURE
        }

        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn wildcard_means_star() {
        let args = Args::parse_from(["porkbun-ddns", "example.com", "--wildcard"]);
        assert_eq!(args.subdomain(), Some("*"));

        let target = RecordTarget::new(&args.root_domain, args.subdomain());
        assert_eq!(target.fqdn(), "*.example.com");
    }

    #[test]
    fn wildcard_and_subdomain_conflict() {
        let parsed =
            Args::try_parse_from(["porkbun-ddns", "example.com", "-w", "-s", "home"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn short_flags_and_defaults() {
        let args = Args::parse_from([
            "porkbun-ddns",
            "example.com",
            "-s",
            "home",
            "-i",
            "203.0.113.5",
            "-c",
        ]);

        assert_eq!(args.subdomain(), Some("home"));
        assert_eq!(args.ip.as_deref(), Some("203.0.113.5"));
        assert!(args.cache_ip);
        assert_eq!(args.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn zero_retries_is_unbounded() {
        let args = Args::parse_from(["porkbun-ddns", "example.com", "--retries", "0"]);
        assert_eq!(args.retry_policy().max_attempts, None);
    }

    #[test]
    fn explicit_cache_file_wins() {
        let args = Args::parse_from(["porkbun-ddns", "example.com", "--cache-file", "/tmp/x.txt"]);
        assert_eq!(args.cache_path(), PathBuf::from("/tmp/x.txt"));
    }
}
