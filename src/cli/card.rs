use std::error::Error;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures_util::{stream, StreamExt};
use tracing::warn;

use crate::cli::context::build_service;
use crate::core::config::data::{path_display, Config};
use crate::model::Uid;
use crate::service::{CardOutcome, CardService, CardServiceError, RenderedCard};

pub struct CardRequest {
    pub uids: Vec<Uid>,
    pub character: usize,
    pub output: Option<PathBuf>,
    pub force_refresh: bool,
    pub base64: bool,
    pub jobs: usize,
}

/// Where the card for `uid` is written.
pub fn output_path(output: Option<&Path>, uid: Uid, index: usize, single: bool) -> PathBuf {
    let file_name = format!("relicard-{}-{}.png", uid, index);
    match output {
        Some(path) if single && path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("png")) => {
            path.to_path_buf()
        }
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

async fn render_one(
    service: &CardService,
    uid: Uid,
    request: &CardRequest,
) -> (Uid, Result<CardOutcome, CardServiceError>) {
    (
        uid,
        service
            .get_card(uid, request.character, request.force_refresh)
            .await,
    )
}

fn write_card(card: &RenderedCard, request: &CardRequest, uid: Uid) -> Result<(), Box<dyn Error>> {
    if request.base64 {
        println!("{}", STANDARD.encode(&card.png));
        return Ok(());
    }
    let path = output_path(
        request.output.as_deref(),
        uid,
        card.character_index,
        request.uids.len() == 1,
    );
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, &card.png)?;
    println!(
        "✅ {} ({}): {}",
        card.character_name,
        uid,
        path_display(&path)
    );
    Ok(())
}

/// Fetch and render every requested UID, at most `jobs` at a time.
pub async fn generate_cards(
    config: &Config,
    theme: Option<&str>,
    request: CardRequest,
) -> Result<(), Box<dyn Error>> {
    let service = build_service(config, theme)?;
    let jobs = request.jobs.max(1);

    let mut results = stream::iter(request.uids.iter().copied())
        .map(|uid| render_one(&service, uid, &request))
        .buffer_unordered(jobs);

    let mut failures = 0usize;
    while let Some((uid, result)) = results.next().await {
        match result {
            Ok(CardOutcome::Ready(card)) => {
                if let Err(err) = write_card(&card, &request, uid) {
                    warn!(uid = %uid, error = %err, "Failed to write card");
                    eprintln!("❌ {uid}: {err}");
                    failures += 1;
                }
            }
            Ok(CardOutcome::NotAvailable(reason)) => {
                eprintln!("⚠️  {uid}: {reason}");
                failures += 1;
            }
            Err(err) => {
                eprintln!("❌ {uid}: {err}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} of {} card(s) could not be produced", failures, request.uids.len()).into());
    }
    Ok(())
}
