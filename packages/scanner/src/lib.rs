#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Quick risk scans of Facebook page URLs.
//!
//! Unlike a case, a scan is answered immediately and nothing is stored.
//! The verdict comes from keywords in the URL itself, picked from a fixed
//! set of risk profiles, with a little random jitter so repeated scans do
//! not look identical.

use chrono::{DateTime, Utc};
use fakesense_case_models::RiskLevel;
use fakesense_pipeline::randomness::Randomness;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Pages the auto-scan "discovers" and filters by keyword.
pub const DISCOVERY_CANDIDATES: [&str; 10] = [
    "https://www.facebook.com/promo-winner-2025",
    "https://www.facebook.com/easy-money-investment",
    "https://www.facebook.com/lucky-draw-thailand",
    "https://www.facebook.com/quick-rich-scheme",
    "https://www.facebook.com/bank-promotion-scam",
    "https://www.facebook.com/news-update-fake",
    "https://www.facebook.com/crypto-investment-fraud",
    "https://www.facebook.com/lottery-winner-scam",
    "https://www.facebook.com/free-money-giveaway",
    "https://www.facebook.com/urgent-transfer-now",
];

/// Keywords the auto-scan advertises. Non-Latin ones are matched through
/// [`KEYWORD_ALIASES`].
pub const SUPPORTED_KEYWORDS: [&str; 6] = [
    "โปรโมชั่น",
    "รางวัล",
    "ลงทุน",
    "รวยเร็ว",
    "ข่าวสาร",
    "แจกเงิน",
];

/// Thai keywords and the URL fragments they stand for.
pub const KEYWORD_ALIASES: [(&str, &[&str]); 4] = [
    ("โปรโมชั่น", &["promo"]),
    ("รางวัล", &["winner", "prize"]),
    ("ลงทุน", &["investment"]),
    ("รวยเร็ว", &["rich", "money"]),
];

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Errors returned by scans.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// No URL was given.
    #[error("A URL to scan is required")]
    MissingUrl,

    /// The URL is not a Facebook URL.
    #[error("Only Facebook URLs are supported: {url}")]
    UnsupportedUrl {
        /// The rejected URL.
        url: String,
    },

    /// An auto-scan was started without keywords.
    #[error("At least one keyword is required")]
    MissingKeywords,
}

/// How a scan was started.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScanType {
    /// A user asked for this URL.
    Manual,
    /// Found by keyword discovery.
    Auto,
}

impl ScanType {
    /// Largest downward trust score jitter. The full draw is
    /// `0..=offset_span`, shifted down by this amount.
    const fn jitter(self) -> i32 {
        match self {
            Self::Manual => 10,
            Self::Auto => 7,
        }
    }

    /// Inclusive upper bound of the trust score offset draw.
    const fn offset_span(self) -> u32 {
        match self {
            Self::Manual => 19,
            Self::Auto => 14,
        }
    }

    /// Inclusive bounds the jittered trust score is clamped to.
    const fn score_bounds(self) -> (i32, i32) {
        match self {
            Self::Manual => (0, 100),
            Self::Auto => (5, 95),
        }
    }

    /// Maximum number of days added to the profile age.
    const fn age_jitter(self) -> u32 {
        match self {
            Self::Manual => 9,
            Self::Auto => 4,
        }
    }

    /// Prefix of result ids.
    const fn id_prefix(self) -> &'static str {
        match self {
            Self::Manual => "scan",
            Self::Auto => "auto",
        }
    }

    /// Keyword profiles and the fallback for URLs matching none of them.
    fn profiles(self) -> (&'static [RiskProfile], &'static RiskProfile) {
        match self {
            Self::Manual => (&MANUAL_PROFILES, &MANUAL_DEFAULT_PROFILE),
            Self::Auto => (&AUTO_PROFILES, &AUTO_DEFAULT_PROFILE),
        }
    }
}

/// Observed page characteristics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanDetails {
    /// Age of the page in days.
    pub profile_age_days: u32,
    /// Number of times the page was renamed.
    pub name_changes: u32,
    /// Suspicious keywords found on the page.
    pub suspicious_keywords: Vec<String>,
    /// Bank account advertised on the page, if any.
    pub bank_account: Option<String>,
}

/// Outcome of a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// Scan id, e.g. `scan_1720000000000_a1b2c3`.
    pub id: String,
    /// Scanned URL.
    pub url: String,
    /// Risk verdict.
    pub risk_level: RiskLevel,
    /// Trust score (0-100). Lower is more suspicious.
    pub trust_score: u8,
    /// When the scan ran.
    pub timestamp: DateTime<Utc>,
    /// How the scan was started.
    pub scan_type: ScanType,
    /// Page characteristics.
    pub details: ScanDetails,
    /// Suggested next step.
    pub recommendation: String,
}

struct RiskProfile {
    triggers: &'static [&'static str],
    risk_level: RiskLevel,
    trust_score: u8,
    profile_age_days: u32,
    name_changes: u32,
    suspicious_keywords: &'static [&'static str],
    bank_account: Option<&'static str>,
    recommendation: &'static str,
}

/// Checked in order; the first profile with a matching trigger wins.
static MANUAL_PROFILES: [RiskProfile; 3] = [
    RiskProfile {
        triggers: &["promo", "prize", "scam"],
        risk_level: RiskLevel::High,
        trust_score: 15,
        profile_age_days: 3,
        name_changes: 5,
        suspicious_keywords: &["promotion", "grand prize", "transfer money", "click the link"],
        bank_account: Some("123-456-7890"),
        recommendation: "Very high risk page. Avoid it and report it to Facebook immediately.",
    },
    RiskProfile {
        triggers: &["invest", "money", "rich"],
        risk_level: RiskLevel::High,
        trust_score: 25,
        profile_age_days: 7,
        name_changes: 3,
        suspicious_keywords: &["investment", "high returns", "get rich quick"],
        bank_account: Some("987-654-3210"),
        recommendation: "Likely investment fraud. Verify licensing before sending any money.",
    },
    RiskProfile {
        triggers: &["news", "update"],
        risk_level: RiskLevel::Medium,
        trust_score: 55,
        profile_age_days: 45,
        name_changes: 1,
        suspicious_keywords: &["breaking news", "update"],
        bank_account: None,
        recommendation: "Moderate risk. Cross-check its claims with other sources.",
    },
];

static MANUAL_DEFAULT_PROFILE: RiskProfile = RiskProfile {
    triggers: &[],
    risk_level: RiskLevel::Low,
    trust_score: 85,
    profile_age_days: 365,
    name_changes: 0,
    suspicious_keywords: &["business", "services"],
    bank_account: None,
    recommendation: "Looks trustworthy, but stay careful with payments.",
};

/// Profiles for pages found by keyword discovery.
static AUTO_PROFILES: [RiskProfile; 3] = [
    RiskProfile {
        triggers: &["scam", "fraud", "promo"],
        risk_level: RiskLevel::High,
        trust_score: 20,
        profile_age_days: 5,
        name_changes: 4,
        suspicious_keywords: &["promotion", "prize", "click the link"],
        bank_account: Some("111-222-3333"),
        recommendation: "High-risk fake page found. Raise an alert now.",
    },
    RiskProfile {
        triggers: &["investment", "money", "rich"],
        risk_level: RiskLevel::High,
        trust_score: 18,
        profile_age_days: 2,
        name_changes: 6,
        suspicious_keywords: &["investment", "get rich quick", "returns"],
        bank_account: Some("444-555-6666"),
        recommendation: "Investment scam page. High risk.",
    },
    RiskProfile {
        triggers: &["news", "update"],
        risk_level: RiskLevel::Medium,
        trust_score: 45,
        profile_age_days: 20,
        name_changes: 2,
        suspicious_keywords: &["news", "share now"],
        bank_account: None,
        recommendation: "Suspicious news page. Check it further.",
    },
];

static AUTO_DEFAULT_PROFILE: RiskProfile = RiskProfile {
    triggers: &[],
    risk_level: RiskLevel::Low,
    trust_score: 75,
    profile_age_days: 90,
    name_changes: 0,
    suspicious_keywords: &["business"],
    bank_account: None,
    recommendation: "Ordinary business page. Low risk.",
};

fn select_profile(url: &str, scan_type: ScanType) -> &'static RiskProfile {
    let url = url.to_lowercase();
    let (profiles, fallback) = scan_type.profiles();
    profiles
        .iter()
        .find(|profile| profile.triggers.iter().any(|t| url.contains(t)))
        .unwrap_or(fallback)
}

/// Validates that `url` is a Facebook URL at all. Looser than the case
/// registry check: any URL mentioning `facebook.com` or `fb.com` passes.
///
/// # Errors
///
/// Returns [`ScanError::MissingUrl`] or [`ScanError::UnsupportedUrl`].
pub fn validate_scan_url(url: &str) -> Result<(), ScanError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ScanError::MissingUrl);
    }
    let lower = url.to_lowercase();
    if !lower.contains("facebook.com") && !lower.contains("fb.com") {
        return Err(ScanError::UnsupportedUrl {
            url: url.to_string(),
        });
    }
    Ok(())
}

/// Scans a single URL.
///
/// # Errors
///
/// Returns [`ScanError`] if the URL fails [`validate_scan_url`].
pub fn scan_page(
    url: &str,
    scan_type: ScanType,
    randomness: &dyn Randomness,
) -> Result<ScanResult, ScanError> {
    validate_scan_url(url)?;
    let url = url.trim();
    let profile = select_profile(url, scan_type);

    let jitter = scan_type.jitter();
    let (min, max) = scan_type.score_bounds();
    let offset = i32::try_from(randomness.next_in(0, scan_type.offset_span())).unwrap_or(jitter)
        - jitter;
    let trust_score = (i32::from(profile.trust_score) + offset).clamp(min, max);
    let profile_age_days =
        profile.profile_age_days + randomness.next_in(0, scan_type.age_jitter());

    let result = ScanResult {
        id: scan_id(scan_type, randomness),
        url: url.to_string(),
        risk_level: profile.risk_level,
        trust_score: u8::try_from(trust_score).unwrap_or(u8::MAX),
        timestamp: Utc::now(),
        scan_type,
        details: ScanDetails {
            profile_age_days,
            name_changes: profile.name_changes,
            suspicious_keywords: profile
                .suspicious_keywords
                .iter()
                .map(ToString::to_string)
                .collect(),
            bank_account: profile.bank_account.map(ToString::to_string),
        },
        recommendation: profile.recommendation.to_string(),
    };

    log::info!(
        "{} scan of {}: {} (trust {})",
        result.scan_type,
        result.url,
        result.risk_level,
        result.trust_score
    );

    Ok(result)
}

/// Returns the candidate pages whose URL contains any of `keywords`
/// (case-insensitive) or a fragment a keyword is aliased to, shuffled and cut
/// down to between two and four.
#[must_use]
pub fn discover_pages(keywords: &[String], randomness: &dyn Randomness) -> Vec<&'static str> {
    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    let mut matched: Vec<&'static str> = DISCOVERY_CANDIDATES
        .iter()
        .copied()
        .filter(|url| keywords.iter().any(|k| keyword_matches(k, url)))
        .collect();

    // Fisher-Yates
    for i in (1..matched.len()).rev() {
        let j = randomness.next_in(0, u32::try_from(i).unwrap_or(u32::MAX)) as usize;
        matched.swap(i, j.min(i));
    }

    let wanted = randomness.next_in(2, 4) as usize;
    matched.truncate(wanted);
    matched
}

fn keyword_matches(keyword: &str, url: &str) -> bool {
    url.contains(keyword)
        || KEYWORD_ALIASES
            .iter()
            .filter(|(alias, _)| *alias == keyword)
            .any(|(_, fragments)| fragments.iter().any(|f| url.contains(f)))
}

/// Discovers pages matching `keywords` and scans each of them.
///
/// # Errors
///
/// Returns [`ScanError::MissingKeywords`] if `keywords` has no non-blank
/// entry.
pub fn auto_scan(
    keywords: &[String],
    randomness: &dyn Randomness,
) -> Result<Vec<ScanResult>, ScanError> {
    if keywords.iter().all(|k| k.trim().is_empty()) {
        return Err(ScanError::MissingKeywords);
    }

    let discovered = discover_pages(keywords, randomness);
    log::info!(
        "Auto scan for {keywords:?} discovered {} pages",
        discovered.len()
    );

    let results: Vec<ScanResult> = discovered
        .into_iter()
        .filter_map(|url| match scan_page(url, ScanType::Auto, randomness) {
            Ok(result) => Some(result),
            Err(e) => {
                log::error!("Failed to scan discovered page {url}: {e}");
                None
            }
        })
        .collect();

    let high = results
        .iter()
        .filter(|r| r.risk_level == RiskLevel::High)
        .count();
    log::info!("Auto scan finished: {} scanned, {high} high risk", results.len());

    Ok(results)
}

fn scan_id(scan_type: ScanType, randomness: &dyn Randomness) -> String {
    let suffix: String = (0..6)
        .map(|_| {
            let max = u32::try_from(BASE36.len() - 1).unwrap_or(0);
            char::from(BASE36[randomness.next_in(0, max) as usize])
        })
        .collect();
    format!(
        "{}_{}_{suffix}",
        scan_type.id_prefix(),
        Utc::now().timestamp_millis()
    )
}
