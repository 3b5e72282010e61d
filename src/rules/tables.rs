//! Static lookup tables consulted by the built-in detectors.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Permissions that grant broad access to browsing data or browser control.
pub(crate) static HIGH_RISK_PERMISSIONS: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| {
        HashMap::from([
            ("tabs", "Can access browser tab information and manipulate tabs"),
            ("webRequest", "Can intercept and modify web requests"),
            ("webRequestBlocking", "Can block and modify web requests in real-time"),
            ("<all_urls>", "Can access all websites and their content"),
            ("cookies", "Can access and modify browser cookies"),
            ("history", "Can access your browsing history"),
            ("management", "Can manage other extensions"),
            ("proxy", "Can control proxy settings"),
            ("webNavigation", "Can track your web navigation"),
            ("downloads", "Can download files and access download history"),
            ("clipboardWrite", "Can modify clipboard content"),
            ("clipboardRead", "Can read clipboard content"),
            ("bookmarks", "Can access and modify bookmarks"),
            ("debugger", "Can debug and manipulate other extensions/apps"),
            ("privacy", "Can modify privacy settings"),
            ("identity", "Can access your identity information"),
        ])
    });

/// Permissions with limited but notable reach.
pub(crate) static MEDIUM_RISK_PERMISSIONS: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| {
        HashMap::from([
            ("storage", "Can store data locally"),
            ("geolocation", "Can access your location"),
            ("notifications", "Can show notifications"),
            ("unlimitedStorage", "Can store unlimited data locally"),
            (
                "activeTab",
                "Can access the active tab when clicking the extension icon",
            ),
            ("contextMenus", "Can add items to the context menu"),
            ("webview", "Can embed web content in the extension"),
        ])
    });

/// Match patterns that cover every site (or the local filesystem).
pub(crate) const MATCH_EVERYTHING_PATTERNS: &[&str] =
    &["*://*/*", "<all_urls>", "*://*", "file:///*", "*"];

/// Substrings marking a host pattern as a high-value target.
pub(crate) const SENSITIVE_DOMAIN_KEYWORDS: &[&str] = &[
    // Banks
    "chase",
    "bankofamerica",
    "wellsfargo",
    "citibank",
    "capitalone",
    "usbank",
    "barclays",
    "hsbc",
    "santander",
    "rbcroyalbank",
    "scotiabank",
    "tdbank",
    // Payments and brokerages
    "paypal",
    "venmo",
    "wise",
    "stripe",
    "square",
    "cashapp",
    "revolut",
    "robinhood",
    "fidelity",
    "vanguard",
    "schwab",
    "etrade",
    // Crypto exchanges and wallets
    "coinbase",
    "binance",
    "kraken",
    "metamask",
    "crypto.com",
    "gemini",
    "ledger",
    "trezor",
    "blockchain.com",
    "ftx",
    "kucoin",
    "bitfinex",
    // Social and email
    "google",
    "facebook",
    "instagram",
    "twitter",
    "linkedin",
    "outlook",
    "protonmail",
    "yahoo",
    "gmail",
    // E-commerce
    "amazon",
    "shopify",
    "ebay",
    "walmart",
    "bestbuy",
    "target",
    // Code hosting
    "github",
    "gitlab",
    "bitbucket",
    "stackoverflow",
    "npmjs",
    "pypi",
    // CI/CD and package registries
    "circleci",
    "jenkins",
    "travis-ci",
    "dockerhub",
    "nuget",
    "maven",
    "rubygems",
    "packagist",
    "crates.io",
    // Generic financial terms
    "banking",
    "invest",
    "wallet",
    "finance",
    "credit",
    "debit",
    "bank",
    "crypto",
];

/// CSP token allowing WebAssembly compilation.
pub(crate) const WASM_UNSAFE_EVAL: &str = "'wasm-unsafe-eval'";

/// CSP token allowing `eval()` and friends.
pub(crate) const UNSAFE_EVAL: &str = "'unsafe-eval'";
