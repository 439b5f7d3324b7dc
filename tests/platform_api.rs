//! Live tests against the donation and tip platforms.

// Only runs with `--features integration_test`; each test skips itself when
// the matching credentials are missing.
#![cfg(feature = "integration_test")]
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use alertdeck::config::Config;
use alertdeck::donations::DonationClient;
use alertdeck::tips::TipClient;

fn load_config() -> Option<Config> {
    match Config::load() {
        Ok(config) => Some(config),
        Err(e) => {
            println!("Skipping integration test: Failed to load config: {e}");
            None
        }
    }
}

#[tokio::test]
async fn test_fetch_recent_donations() {
    let Some(config) = load_config() else { return };
    if !config.has_donation_credentials() {
        println!(r#"Skipping integration test: DONATION_API_TOKEN not found in environment/".env" file."#);
        return;
    }

    let client = DonationClient::new(&config);
    match client.recent_donations(5).await {
        Ok(donations) => {
            println!("Fetched {} donations.", donations.len());
            assert!(donations.len() <= 5);
            assert!(donations.windows(2).all(|w| w[0].created_at <= w[1].created_at));
        }
        Err(e) => panic!("recent_donations failed: {e}"),
    }
}

#[tokio::test]
async fn test_fetch_recent_tips() {
    let Some(config) = load_config() else { return };
    if !config.has_tip_credentials() {
        println!(r#"Skipping integration test: TIP_API_TOKEN/TIP_CHANNEL_ID not found in environment/".env" file."#);
        return;
    }

    let client = TipClient::new(&config);
    match client.recent_tips(5).await {
        Ok(tips) => {
            println!("Fetched {} tips.", tips.len());
            assert!(tips.len() <= 5);
        }
        Err(e) => panic!("recent_tips failed: {e}"),
    }
}
