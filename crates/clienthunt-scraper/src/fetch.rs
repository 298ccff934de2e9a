//! Low-level HTTP helpers shared by the provider adapters.

use std::time::Duration;

use crate::error::ScraperError;

pub(crate) const BROWSER_FALLBACK_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-IN,en;q=0.9";
const BROWSER_FETCH_ATTEMPTS: usize = 3;
const BROWSER_FETCH_BACKOFF_MS: [u64; 3] = [0, 300, 900];

/// Build the shared `reqwest::Client` for one adapter.
///
/// # Errors
///
/// Returns [`ScraperError::Http`] if the client cannot be constructed.
pub(crate) fn build_client(
    timeout_secs: u64,
    user_agent: &str,
) -> Result<reqwest::Client, ScraperError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Fetch a directory page once, mapping the response status onto typed
/// errors so [`crate::rate_limit::retry_with_backoff`] can decide whether to
/// try again.
pub(crate) async fn fetch_page(
    client: &reqwest::Client,
    url: &str,
    user_agent: &str,
) -> Result<String, ScraperError> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, user_agent)
        .header(reqwest::header::ACCEPT, HTML_ACCEPT)
        .header(reqwest::header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
        .send()
        .await?;

    check_status(&response, url)?;

    let body = response.text().await?;
    if looks_like_bot_challenge(&body) {
        return Err(ScraperError::Blocked {
            url: url.to_owned(),
        });
    }
    Ok(body)
}

/// Fetch the HTML body of a URL the way a browser would.
///
/// `curl` invocation for one page. The child is killed if the fetch future
/// is dropped, e.g. when the scrape deadline fires mid-request.
fn curl_command(url: &str, timeout_secs: u64) -> tokio::process::Command {
    let mut command = tokio::process::Command::new("curl");
    command
        .arg("-Lsf")
        .arg("--proto")
        .arg("=https,http")
        .arg("--max-filesize")
        .arg("10485760")
        .arg("--max-time")
        .arg(timeout_secs.to_string())
        .arg("--user-agent")
        .arg(BROWSER_FALLBACK_UA)
        .arg(url)
        .kill_on_drop(true);
    command
}

/// Tries `curl` with a browser user-agent first (some anti-bot stacks let
/// curl fingerprints through while blocking reqwest), then reqwest with the
/// configured UA and the browser UA. Returns the first usable body.
pub(crate) async fn fetch_html(
    client: &reqwest::Client,
    url: &str,
    timeout_secs: u64,
    user_agent: &str,
) -> Result<String, ScraperError> {
    let mut saw_challenge = false;

    for attempt in 0..BROWSER_FETCH_ATTEMPTS {
        if let Some(delay_ms) = BROWSER_FETCH_BACKOFF_MS.get(attempt).copied() {
            if delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }

        let curl_output = curl_command(url, timeout_secs).output().await;

        if let Ok(output) = curl_output {
            if output.status.success() {
                let body = String::from_utf8_lossy(&output.stdout).to_string();
                if is_usable_html(&body) {
                    return Ok(body);
                }
                saw_challenge |= looks_like_bot_challenge(&body);
            }
        }

        let mut user_agents = vec![BROWSER_FALLBACK_UA.to_string()];
        if user_agent != BROWSER_FALLBACK_UA {
            user_agents.push(user_agent.to_string());
        }

        for ua in user_agents {
            match fetch_page(client, url, &ua).await {
                Ok(body) if is_usable_html(&body) => return Ok(body),
                Ok(_) => {}
                Err(ScraperError::Blocked { .. }) => saw_challenge = true,
                Err(err) => {
                    tracing::debug!(url, attempt, error = %err, "browser-style fetch failed");
                }
            }
        }
    }

    if saw_challenge {
        return Err(ScraperError::Blocked {
            url: url.to_owned(),
        });
    }
    Err(ScraperError::AllAttemptsFailed {
        url: url.to_owned(),
    })
}

/// Perform a GET with query parameters and parse the body as JSON.
pub(crate) async fn fetch_json(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, &str)],
    user_agent: &str,
) -> Result<serde_json::Value, ScraperError> {
    let response = client
        .get(url)
        .query(query)
        .header(reqwest::header::USER_AGENT, user_agent)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await?;

    check_status(&response, url)?;

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|source| ScraperError::Deserialize {
        context: url.to_owned(),
        source,
    })
}

fn check_status(response: &reqwest::Response, url: &str) -> Result<(), ScraperError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);
        return Err(ScraperError::RateLimited {
            domain: response.url().host_str().unwrap_or("unknown").to_owned(),
            retry_after_secs,
        });
    }
    Err(ScraperError::HttpStatus {
        status: status.as_u16(),
        url: url.to_owned(),
    })
}

fn is_usable_html(body: &str) -> bool {
    let trimmed = body.trim();
    !trimmed.is_empty() && !looks_like_bot_challenge(trimmed)
}

pub(crate) fn looks_like_bot_challenge(body: &str) -> bool {
    let lowered = body.to_ascii_lowercase();
    let has_cloudflare_banner = lowered.contains("attention required! | cloudflare");
    let has_challenge_platform = lowered.contains("/cdn-cgi/challenge-platform/");
    let has_just_a_moment = lowered.contains("just a moment...");
    let has_cookie_gate = lowered.contains("please enable cookies");
    let has_cf_chl = lowered.contains("cf-chl-");
    let has_access_denied = lowered.contains("<title>access denied</title>");

    has_cloudflare_banner
        || has_challenge_platform
        || has_access_denied
        || (has_just_a_moment && has_cookie_gate)
        || (has_just_a_moment && has_cf_chl)
}
