//! Run orchestration: resolve everything up front, then provision each host
//! sequentially, accumulating per-host outcomes without aborting the batch.

use std::sync::Arc;
use std::time::Instant;

use fleetkey_core::{HostRunOutcome, Interact, PublicKeyLine, Result, Secret};
use fleetkey_secrets::{
    resolve_secret_reference, BitwardenProvider, InfisicalProvider, LocalProvider,
    ProviderRegistry, SecretProvider,
};
use fleetkey_ssh::{
    provision_host, resolve_hosts, resolve_public_key, ClientConfig, HostKeyVerifier,
    HostVerification,
};

use crate::cli::Cli;
use crate::interact::TerminalInteract;
use crate::options::Options;

/// Execute one run. Returns the number of failed hosts; any error means the
/// run aborted before the first provisioning attempt.
pub async fn execute(cli: Cli) -> Result<usize> {
    let options = Options::from_cli(&cli)?;
    let interact: Arc<dyn Interact> = Arc::new(TerminalInteract::new());

    // the credential is resolved once per run, never once per host
    let password = resolve_password(&options).await?;
    let hosts = resolve_hosts(
        options.host.as_deref(),
        options.hosts.as_deref(),
        options.hosts_file.as_deref(),
        options.port,
    )?;
    let key = resolve_public_key(options.key.as_deref(), options.key_file.as_deref())?;

    tracing::info!(
        hosts = hosts.len(),
        key_type = key.key_type(),
        fingerprint = %key.sha256_fingerprint(),
        "resolved run inputs"
    );

    if options.dry_run {
        interact.info(&format!(
            "dry run: would provision {} ({}) on:",
            key.key_type(),
            key.sha256_fingerprint()
        ));
        for host in &hosts {
            interact.info(&format!("  {host}"));
        }
        return Ok(0);
    }

    let verification = if options.insecure {
        HostVerification::InsecureAcceptAny
    } else {
        HostVerification::Tofu(Arc::new(HostKeyVerifier::new(
            options.known_hosts.clone(),
            interact.clone(),
        )?))
    };

    let config = Arc::new(ClientConfig {
        username: options.username.clone(),
        password,
        verification,
        timeout: options.timeout,
    });
    let key = Arc::new(key);

    let mut outcomes: Vec<HostRunOutcome> = Vec::with_capacity(hosts.len());
    for host in hosts {
        let started = Instant::now();
        let outcome = {
            let config = Arc::clone(&config);
            let key: Arc<PublicKeyLine> = Arc::clone(&key);
            let task_host = host.clone();
            let result =
                tokio::task::spawn_blocking(move || provision_host(&task_host, &key, &config))
                    .await;
            let elapsed = started.elapsed();
            match result {
                Ok(Ok(())) => HostRunOutcome::ok(host, elapsed),
                Ok(Err(err)) => HostRunOutcome::failed(host, elapsed, err.to_string()),
                Err(join_err) => HostRunOutcome::failed(
                    host,
                    elapsed,
                    format!("provisioning task panicked: {join_err}"),
                ),
            }
        };
        report_outcome(interact.as_ref(), &outcome);
        outcomes.push(outcome);
    }

    Ok(recap(interact.as_ref(), &outcomes))
}

async fn resolve_password(options: &Options) -> Result<Secret> {
    if options.password_ref.is_empty() {
        return LocalProvider::new().resolve("").await;
    }
    let registry = build_registry(options)?;
    resolve_secret_reference(&options.password_ref, &registry).await
}

fn build_registry(options: &Options) -> Result<ProviderRegistry> {
    let registry = ProviderRegistry::new();
    registry.register(Arc::new(BitwardenProvider::from_env()))?;
    registry.register(Arc::new(InfisicalProvider::from_env(
        options.infisical_mode,
    )?))?;
    Ok(registry)
}

fn report_outcome(interact: &dyn Interact, outcome: &HostRunOutcome) {
    match &outcome.error {
        None => interact.info(&format!(
            "{}: ok ({}ms)",
            outcome.host,
            outcome.elapsed.as_millis()
        )),
        Some(message) => interact.info(&format!(
            "{}: FAILED ({}ms): {message}",
            outcome.host,
            outcome.elapsed.as_millis()
        )),
    }
}

/// Print the final recap and return the failure count.
fn recap(interact: &dyn Interact, outcomes: &[HostRunOutcome]) -> usize {
    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    let ok = outcomes.len() - failed;
    interact.info(&format!(
        "done: {ok} provisioned, {failed} failed, {} total",
        outcomes.len()
    ));
    failed
}
