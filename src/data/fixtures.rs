//! Static mock data standing in for a real market backend.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::alerts::{AlertKind, DeliveryChannel, RecentAlert, UserAlert};
use crate::arbitrage::{ArbitrageOpportunity, OpportunityStatus, Platform};
use crate::data::types::{Market, MarketCategory, Prediction, QuickStat, Side};
use crate::portfolio::Position;

struct MarketRow {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: MarketCategory,
    yes_odds: f64,
    change_24h: f64,
    volume: &'static str,
    volume_24h: &'static str,
    liquidity: &'static str,
    end_date: (i32, u32, u32),
    slug: &'static str,
}

const MARKET_ROWS: [MarketRow; 20] = [
    MarketRow {
        id: "1",
        name: "Will Bitcoin reach $150,000 by end of 2026?",
        description: "This market will resolve to 'Yes' if Bitcoin (BTC) reaches or exceeds $150,000 USD at any point before December 31, 2026 11:59 PM ET.",
        category: MarketCategory::Crypto,
        yes_odds: 42.0,
        change_24h: 3.2,
        volume: "$12.4M",
        volume_24h: "$892K",
        liquidity: "$1.2M",
        end_date: (2026, 12, 31),
        slug: "bitcoin-150k-2026",
    },
    MarketRow {
        id: "2",
        name: "Will the Federal Reserve cut rates in Q1 2026?",
        description: "This market will resolve to 'Yes' if the Federal Reserve announces a rate cut during Q1 2026 (January - March).",
        category: MarketCategory::Economics,
        yes_odds: 67.0,
        change_24h: -1.5,
        volume: "$8.7M",
        volume_24h: "$456K",
        liquidity: "$890K",
        end_date: (2026, 3, 31),
        slug: "fed-rate-cut-q1-2026",
    },
    MarketRow {
        id: "3",
        name: "Will Ethereum flip Bitcoin market cap in 2026?",
        description: "This market resolves 'Yes' if Ethereum's market capitalization exceeds Bitcoin's at any point during 2026.",
        category: MarketCategory::Crypto,
        yes_odds: 18.0,
        change_24h: 0.8,
        volume: "$5.2M",
        volume_24h: "$234K",
        liquidity: "$567K",
        end_date: (2026, 12, 31),
        slug: "eth-flip-btc-2026",
    },
    MarketRow {
        id: "4",
        name: "Will OpenAI release GPT-5 by July 2026?",
        description: "Resolves 'Yes' if OpenAI publicly releases or announces general availability of GPT-5 before July 1, 2026.",
        category: MarketCategory::Tech,
        yes_odds: 78.0,
        change_24h: 5.4,
        volume: "$15.8M",
        volume_24h: "$1.2M",
        liquidity: "$2.1M",
        end_date: (2026, 7, 1),
        slug: "openai-gpt5-july-2026",
    },
    MarketRow {
        id: "5",
        name: "Will SpaceX complete Starship orbital flight by March 2026?",
        description: "This market resolves 'Yes' if SpaceX successfully completes a full orbital flight with Starship before March 31, 2026.",
        category: MarketCategory::Tech,
        yes_odds: 85.0,
        change_24h: 2.1,
        volume: "$9.3M",
        volume_24h: "$678K",
        liquidity: "$1.5M",
        end_date: (2026, 3, 31),
        slug: "spacex-starship-orbital-2026",
    },
    MarketRow {
        id: "6",
        name: "Will US inflation drop below 2% in 2026?",
        description: "Resolves 'Yes' if the US CPI year-over-year inflation rate drops below 2% at any point during 2026.",
        category: MarketCategory::Economics,
        yes_odds: 34.0,
        change_24h: -0.7,
        volume: "$4.1M",
        volume_24h: "$189K",
        liquidity: "$445K",
        end_date: (2026, 12, 31),
        slug: "us-inflation-below-2-2026",
    },
    MarketRow {
        id: "7",
        name: "Will Apple release AR glasses in 2026?",
        description: "This market resolves 'Yes' if Apple announces and releases consumer AR glasses (not Vision Pro) in 2026.",
        category: MarketCategory::Tech,
        yes_odds: 29.0,
        change_24h: 1.2,
        volume: "$6.7M",
        volume_24h: "$312K",
        liquidity: "$678K",
        end_date: (2026, 12, 31),
        slug: "apple-ar-glasses-2026",
    },
    MarketRow {
        id: "8",
        name: "Will Solana reach $500 in 2026?",
        description: "Resolves 'Yes' if Solana (SOL) reaches or exceeds $500 USD at any point during 2026.",
        category: MarketCategory::Crypto,
        yes_odds: 23.0,
        change_24h: 4.6,
        volume: "$7.8M",
        volume_24h: "$567K",
        liquidity: "$890K",
        end_date: (2026, 12, 31),
        slug: "solana-500-2026",
    },
    MarketRow {
        id: "9",
        name: "Will there be a US recession in 2026?",
        description: "This market resolves 'Yes' if the NBER declares a recession that includes any months in 2026.",
        category: MarketCategory::Economics,
        yes_odds: 31.0,
        change_24h: -2.3,
        volume: "$11.2M",
        volume_24h: "$789K",
        liquidity: "$1.3M",
        end_date: (2026, 12, 31),
        slug: "us-recession-2026",
    },
    MarketRow {
        id: "10",
        name: "Will Tesla deliver 3 million vehicles in 2026?",
        description: "Resolves 'Yes' if Tesla reports total vehicle deliveries of 3 million or more for calendar year 2026.",
        category: MarketCategory::Tech,
        yes_odds: 52.0,
        change_24h: 1.8,
        volume: "$8.9M",
        volume_24h: "$445K",
        liquidity: "$923K",
        end_date: (2026, 12, 31),
        slug: "tesla-3m-deliveries-2026",
    },
    MarketRow {
        id: "11",
        name: "Will Netflix stock exceed $1000 in 2026?",
        description: "This market resolves 'Yes' if Netflix (NFLX) stock price reaches or exceeds $1000 at any point during 2026.",
        category: MarketCategory::Entertainment,
        yes_odds: 41.0,
        change_24h: 0.5,
        volume: "$3.4M",
        volume_24h: "$156K",
        liquidity: "$345K",
        end_date: (2026, 12, 31),
        slug: "netflix-1000-2026",
    },
    MarketRow {
        id: "12",
        name: "Will Super Bowl LX have over 120M US viewers?",
        description: "Resolves 'Yes' if Super Bowl LX (February 2026) attracts more than 120 million US viewers according to Nielsen.",
        category: MarketCategory::Sports,
        yes_odds: 73.0,
        change_24h: 0.9,
        volume: "$2.1M",
        volume_24h: "$98K",
        liquidity: "$234K",
        end_date: (2026, 2, 15),
        slug: "super-bowl-lx-viewers",
    },
    MarketRow {
        id: "13",
        name: "Will China land astronauts on the Moon by 2026?",
        description: "This market resolves 'Yes' if China successfully lands astronauts on the Moon before December 31, 2026.",
        category: MarketCategory::Tech,
        yes_odds: 8.0,
        change_24h: -0.2,
        volume: "$1.8M",
        volume_24h: "$67K",
        liquidity: "$189K",
        end_date: (2026, 12, 31),
        slug: "china-moon-landing-2026",
    },
    MarketRow {
        id: "14",
        name: "Will S&P 500 reach 7000 in 2026?",
        description: "Resolves 'Yes' if the S&P 500 index reaches or exceeds 7000 points at any time during 2026.",
        category: MarketCategory::Economics,
        yes_odds: 56.0,
        change_24h: 2.7,
        volume: "$14.5M",
        volume_24h: "$934K",
        liquidity: "$1.8M",
        end_date: (2026, 12, 31),
        slug: "sp500-7000-2026",
    },
    MarketRow {
        id: "15",
        name: "Will Nvidia remain the largest company by market cap through 2026?",
        description: "This market resolves 'Yes' if Nvidia maintains the #1 position by market cap for the entirety of 2026.",
        category: MarketCategory::Tech,
        yes_odds: 38.0,
        change_24h: -1.9,
        volume: "$10.2M",
        volume_24h: "$723K",
        liquidity: "$1.1M",
        end_date: (2026, 12, 31),
        slug: "nvidia-largest-cap-2026",
    },
    MarketRow {
        id: "16",
        name: "Will XRP reach $10 in 2026?",
        description: "Resolves 'Yes' if XRP reaches or exceeds $10 USD at any point during 2026.",
        category: MarketCategory::Crypto,
        yes_odds: 12.0,
        change_24h: 6.2,
        volume: "$4.6M",
        volume_24h: "$389K",
        liquidity: "$512K",
        end_date: (2026, 12, 31),
        slug: "xrp-10-2026",
    },
    MarketRow {
        id: "17",
        name: "Will the Chiefs win Super Bowl LX?",
        description: "This market resolves 'Yes' if the Kansas City Chiefs win Super Bowl LX in February 2026.",
        category: MarketCategory::Sports,
        yes_odds: 22.0,
        change_24h: 3.4,
        volume: "$5.8M",
        volume_24h: "$423K",
        liquidity: "$678K",
        end_date: (2026, 2, 15),
        slug: "chiefs-super-bowl-lx",
    },
    MarketRow {
        id: "18",
        name: "Will a major AI company face antitrust action in 2026?",
        description: "Resolves 'Yes' if the US DOJ or FTC files formal antitrust charges against a major AI company (OpenAI, Google, Microsoft, Anthropic) in 2026.",
        category: MarketCategory::Tech,
        yes_odds: 45.0,
        change_24h: 1.1,
        volume: "$3.2M",
        volume_24h: "$178K",
        liquidity: "$289K",
        end_date: (2026, 12, 31),
        slug: "ai-antitrust-2026",
    },
    MarketRow {
        id: "19",
        name: "Will gold reach $3000/oz in 2026?",
        description: "This market resolves 'Yes' if gold spot price reaches or exceeds $3000 per ounce at any point during 2026.",
        category: MarketCategory::Economics,
        yes_odds: 61.0,
        change_24h: 0.4,
        volume: "$6.1M",
        volume_24h: "$298K",
        liquidity: "$567K",
        end_date: (2026, 12, 31),
        slug: "gold-3000-2026",
    },
    MarketRow {
        id: "20",
        name: "Will Anthropic release Claude 4 by mid-2026?",
        description: "Resolves 'Yes' if Anthropic publicly releases Claude 4 (or successor named model) before July 1, 2026.",
        category: MarketCategory::Tech,
        yes_odds: 71.0,
        change_24h: 2.8,
        volume: "$7.4M",
        volume_24h: "$534K",
        liquidity: "$812K",
        end_date: (2026, 7, 1),
        slug: "anthropic-claude4-2026",
    },
];

pub fn markets() -> Vec<Market> {
    MARKET_ROWS
        .iter()
        .map(|row| {
            let (y, m, d) = row.end_date;
            Market {
                id: row.id.to_string(),
                name: row.name.to_string(),
                description: row.description.to_string(),
                category: row.category,
                yes_odds: row.yes_odds,
                no_odds: 100.0 - row.yes_odds,
                change_24h: row.change_24h,
                volume: row.volume.to_string(),
                volume_24h: row.volume_24h.to_string(),
                liquidity: row.liquidity.to_string(),
                end_date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
                active: true,
                image: None,
                slug: row.slug.to_string(),
            }
        })
        .collect()
}

pub fn recent_alerts(now: DateTime<Utc>) -> Vec<RecentAlert> {
    let rows: [(&str, AlertKind, &str, &str, i64); 5] = [
        ("1", AlertKind::OddsMovement, "ETH Price >$3,000", "Odds increased by 15% in the last 4 hours", 2),
        ("2", AlertKind::VolumeSpike, "2026 Midterm Elections", "Volume increased by 200% in the last hour", 4),
        ("3", AlertKind::Arbitrage, "Bitcoin >$150k", "6.2% arbitrage opportunity detected", 5),
        ("4", AlertKind::PriceTarget, "Tesla Stock Performance", "Target price reached: $500", 8),
        ("5", AlertKind::OddsMovement, "Apple AR Glasses Launch", "Odds decreased by 12% in the last 6 hours", 12),
    ];

    rows.into_iter()
        .map(|(id, kind, market, description, hours_ago)| RecentAlert {
            id: id.to_string(),
            kind,
            market: market.to_string(),
            description: description.to_string(),
            raised_at: now - Duration::hours(hours_ago),
        })
        .collect()
}

pub fn user_alerts(now: DateTime<Utc>) -> Vec<UserAlert> {
    use DeliveryChannel::{Email, Push};

    let rows: [(u32, &str, AlertKind, &str, &str, &[DeliveryChannel], bool, Duration, u32); 5] = [
        (
            1,
            "BTC >$150k odds spike",
            AlertKind::OddsMovement,
            "Bitcoin to reach $150k by March 2027",
            "When YES odds increase by >10% within 24h",
            &[Email, Push],
            true,
            Duration::hours(2),
            3,
        ),
        (
            2,
            "Election volume alert",
            AlertKind::VolumeSpike,
            "2026 Midterm Elections",
            "When volume increases by >100% in 1 hour",
            &[Email],
            true,
            Duration::days(1),
            8,
        ),
        (
            3,
            "Fed decision movement",
            AlertKind::OddsMovement,
            "Fed Rate Cut Q1 2026",
            "When odds change by >15% either direction",
            &[Push],
            false,
            Duration::days(5),
            2,
        ),
        (
            4,
            "New crypto markets",
            AlertKind::NewMarket,
            "All markets matching 'crypto'",
            "When a new crypto market is created",
            &[Email, Push],
            true,
            Duration::hours(3),
            12,
        ),
        (
            5,
            "AI market tracker",
            AlertKind::OddsMovement,
            "GPT-5 Release by June 2026",
            "When YES odds increase by >8% within 12h",
            &[Email],
            true,
            Duration::hours(6),
            5,
        ),
    ];

    rows.into_iter()
        .map(|(id, name, kind, market, condition, delivery, active, ago, count)| UserAlert {
            id,
            name: name.to_string(),
            kind,
            market: market.to_string(),
            condition: condition.to_string(),
            delivery: delivery.to_vec(),
            active,
            last_triggered: Some(now - ago),
            trigger_count: count,
        })
        .collect()
}

pub fn arbitrage_opportunities(now: DateTime<Utc>) -> Vec<ArbitrageOpportunity> {
    use OpportunityStatus::{Active, Fading};
    use Platform::{Kalshi, Polymarket, PredictIt};

    let rows = [
        (1, "Bitcoin to reach $150k by March 2027", Polymarket, Kalshi, 68.0, 62.0, 8.3, 1000.0, 1083.0, 3, Active),
        (2, "Fed Rate Cut in Q1 2026", Polymarket, PredictIt, 44.0, 51.0, 6.2, 1500.0, 1593.0, 12, Active),
        (3, "GPT-5 Release by June 2026", Polymarket, Kalshi, 71.0, 65.0, 5.8, 800.0, 846.0, 28, Active),
        (4, "Tesla Stock >$500 EOY 2026", Kalshi, PredictIt, 42.0, 38.0, 4.2, 2000.0, 2084.0, 45, Fading),
        (5, "Apple AR Glasses Launch 2026", Polymarket, Kalshi, 54.0, 48.0, 7.1, 1200.0, 1285.0, 60, Active),
        (6, "SpaceX Mars Landing 2026", Kalshi, PredictIt, 19.0, 15.0, 9.4, 500.0, 547.0, 80, Fading),
    ];

    rows.into_iter()
        .map(
            |(id, market, platform1, platform2, odds1, odds2, profit, capital, expected_return, minutes_ago, status)| {
                ArbitrageOpportunity {
                    id,
                    market: market.to_string(),
                    platform1,
                    platform2,
                    odds1,
                    odds2,
                    profit,
                    capital,
                    expected_return,
                    detected_at: now - Duration::minutes(minutes_ago),
                    status,
                }
            },
        )
        .collect()
}

pub fn positions() -> Vec<Position> {
    let rows: [(u32, &str, Option<&str>, Platform, Side, f64, f64, f64); 5] = [
        (1, "2024 Presidential Election - Democratic Victory", None, Platform::Polymarket, Side::Yes, 0.45, 0.52, 200.0),
        (2, "Bitcoin >$100k by March 2026", Some("1"), Platform::Polymarket, Side::Yes, 0.62, 0.68, 150.0),
        (3, "Fed Rate Cut Q1 2026", Some("2"), Platform::Polymarket, Side::No, 0.58, 0.56, 100.0),
        (4, "GPT-5 Release by June 2026", Some("4"), Platform::Polymarket, Side::Yes, 0.65, 0.71, 80.0),
        (5, "Tesla Stock >$300 EOY", Some("10"), Platform::Kalshi, Side::Yes, 0.38, 0.42, 250.0),
    ];

    rows.into_iter()
        .map(|(id, market, market_id, platform, side, entry_price, current_price, quantity)| Position {
            id,
            market: market.to_string(),
            market_id: market_id.map(str::to_string),
            platform,
            side,
            entry_price,
            current_price,
            quantity,
        })
        .collect()
}

pub fn predictions() -> Vec<Prediction> {
    [
        ("Trump wins 2028", 67, 5),
        ("Bitcoin reaches $150k", 43, -2),
        ("AI passes Turing test", 89, 12),
        ("Recession in Q2 2026", 31, -8),
        ("Apple releases AR glasses", 54, 3),
        ("Lakers win NBA Finals", 28, 6),
        ("Fed cuts rates in 2026", 72, 15),
        ("SpaceX Mars landing", 19, -4),
        ("Ethereum hits $5k", 81, 9),
        ("Tesla reaches $500", 45, -11),
        ("OpenAI IPO in 2026", 37, 8),
        ("Nuclear fusion breakthrough", 24, 3),
        ("Climate bill passes Congress", 56, -5),
        ("Apple Vision Pro V2 ships", 78, 14),
        ("US debt ceiling raised", 92, 7),
    ]
    .into_iter()
    .map(|(text, probability, change)| Prediction {
        text: text.to_string(),
        probability,
        change,
    })
    .collect()
}

pub fn quick_stats() -> Vec<QuickStat> {
    [
        ("Active Positions", "12", None, false),
        ("Total P&L", "+$1,247", Some("+8.3%"), true),
        ("Alerts Triggered", "8 today", None, false),
        ("Arbitrage Opps", "3 active", None, false),
    ]
    .into_iter()
    .map(|(label, value, change, positive)| QuickStat {
        label: label.to_string(),
        value: value.to_string(),
        change: change.map(str::to_string),
        positive,
    })
    .collect()
}
