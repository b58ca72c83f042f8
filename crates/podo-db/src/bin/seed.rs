//! # Seed Data Generator
//!
//! Populates the database with a small shop for development.
//!
//! ## Usage
//! ```bash
//! # Seed the database from the config file (or the platform default)
//! cargo run -p podo-db --bin seed
//!
//! # Specify database path
//! cargo run -p podo-db --bin seed -- --db ./data/podo.db
//!
//! # Use a specific config file
//! cargo run -p podo-db --bin seed -- --config ./ledger.toml
//! ```
//!
//! ## Generated Data
//! - Branches: Mokpo (MP), Ganghwa (GH), Gwangju (GJ, pending)
//! - Shelves for every branch, all four shelf types
//! - Four owners with rented shelves
//! - Five books and three goods items
//! - Sample sales run through the ledger, so every balance has a sale behind it
//! - A welcome notification

use chrono::{DateTime, TimeZone, Utc};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use podo_core::notification::NullSink;
use podo_core::{
    BookInfo, Branch, BranchStatus, Item, ItemCategory, ItemRef, Money, Notification, NotificationKind, NotificationTarget, Owner,
    OwnerStatus, PaymentMethod, Shelf, ShelfType,
};
use podo_db::{Collection, Database, Ledger, LedgerConfig, NotificationRing, SaleRequest};

/// (id, name, code, status, shelves per type in M/S/L/F order)
const BRANCHES: &[(&str, &str, &str, BranchStatus, [u32; 4])] = &[
    ("BR001", "목포점", "MP", BranchStatus::Active, [40, 100, 60, 20]),
    ("BR002", "강화점", "GH", BranchStatus::Active, [30, 80, 30, 10]),
    ("BR003", "광주점", "GJ", BranchStatus::Pending, [50, 150, 80, 20]),
];

/// (id, number, name, phone, email, branch, shelf codes)
const OWNERS: &[(&str, &str, &str, &str, &str, &str, &[&str])] = &[
    ("OW001", "MP001", "김포도", "010-1234-5678", "kim@test.com", "BR001", &["S01", "S02"]),
    ("OW002", "MP002", "이책방", "010-2345-6789", "lee@test.com", "BR001", &["L01"]),
    ("OW003", "GH001", "박문학", "010-3456-7890", "park@test.com", "BR002", &["S01", "S02", "S03"]),
    ("OW004", "MP003", "최서점", "010-4567-8901", "choi@test.com", "BR001", &["F01"]),
];

struct BookRow {
    id: &'static str,
    isbn: &'static str,
    title: &'static str,
    author: &'static str,
    publisher: &'static str,
    pub_year: &'static str,
    price: i64,
    original_price: i64,
    quantity: u32,
    condition: &'static str,
    shelf: &'static str,
    owner: &'static str,
}

const BOOKS: &[BookRow] = &[
    BookRow { id: "BK001", isbn: "9788937460784", title: "데미안", author: "헤르만 헤세", publisher: "민음사", pub_year: "2009", price: 12_000, original_price: 12_000, quantity: 1, condition: "used", shelf: "S01", owner: "OW001" },
    BookRow { id: "BK002", isbn: "9788937473135", title: "아몬드", author: "손원평", publisher: "창비", pub_year: "2017", price: 12_000, original_price: 12_000, quantity: 1, condition: "owner_new", shelf: "S02", owner: "OW001" },
    BookRow { id: "BK003", isbn: "9791190030915", title: "달러구트 꿈 백화점", author: "이미예", publisher: "팩토리나인", pub_year: "2020", price: 14_000, original_price: 14_000, quantity: 2, condition: "order_new", shelf: "L01", owner: "OW002" },
    BookRow { id: "BK004", isbn: "9788932917245", title: "어린 왕자", author: "생텍쥐페리", publisher: "문학동네", pub_year: "2015", price: 10_000, original_price: 12_000, quantity: 1, condition: "used", shelf: "S01", owner: "OW003" },
    BookRow { id: "BK005", isbn: "9791168340442", title: "불편한 편의점", author: "김호연", publisher: "나무옆의자", pub_year: "2021", price: 14_000, original_price: 14_000, quantity: 1, condition: "owner_new", shelf: "S02", owner: "OW003" },
];

/// (id, branch, name, price, quantity, condition, shelf, owner)
const GOODS: &[(&str, &str, &str, i64, u32, &str, &str, Option<&str>)] = &[
    ("GD001", "BR001", "포도책방 에코백", 15_000, 10, "house_made", "", None),
    ("GD002", "BR001", "손글씨 엽서 세트", 8_000, 5, "handmade", "S01", Some("OW001")),
    ("GD003", "BR002", "강화 특산 북마크", 5_000, 20, "collab", "S01", Some("OW003")),
];

/// (item, payment, sold at)
const SALES: &[(ItemCategory, &str, PaymentMethod, (u32, u32))] = &[
    (ItemCategory::Book, "BK001", PaymentMethod::Card, (12, 2)),
    (ItemCategory::Goods, "GD002", PaymentMethod::Cash, (12, 2)),
    (ItemCategory::Book, "BK004", PaymentMethod::Card, (12, 3)),
    (ItemCategory::Goods, "GD003", PaymentMethod::Cash, (12, 3)),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Podo Books Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (default: from config)");
                println!("  -c, --config <PATH>   Config file path");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = LedgerConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = Some(path);
    }
    config.logging.init();

    let db_config = config.db_config()?;
    println!("🌱 Podo Books Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_config.database_path.display());
    println!();

    if let Some(parent) = db_config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::new(db_config).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing: Vec<Branch> = db.store().load(Collection::Branches).await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} branches", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let mut tx = db.begin_write().await?;

    // Branches and shelves
    let mut shelves = Vec::new();
    for (id, name, code, status, counts) in BRANCHES {
        tx.catalog()
            .add_branch(Branch {
                id: id.to_string(),
                name: name.to_string(),
                code: code.to_string(),
                status: *status,
            })
            .await?;
        for (shelf_type, count) in ShelfType::ALL.iter().zip(counts) {
            shelves.extend((1..=*count).map(|n| Shelf::new(*id, code, *shelf_type, n)));
        }
    }

    // Owners, with their shelves marked as rented
    for (id, number, name, phone, email, branch, codes) in OWNERS {
        for shelf in shelves
            .iter_mut()
            .filter(|s| s.branch_id == *branch && codes.contains(&s.code.as_str()))
        {
            shelf.owner_id = Some(id.to_string());
        }
        tx.catalog()
            .import_owner(Owner {
                id: id.to_string(),
                owner_number: number.to_string(),
                name: name.to_string(),
                phone: Some(phone.to_string()),
                email: Some(email.to_string()),
                branch_id: branch.to_string(),
                shelves: codes.iter().map(|c| c.to_string()).collect(),
                balance: Money::zero(),
                status: OwnerStatus::Active,
                created_at: day(2024, 6, 15),
            })
            .await?;
    }
    let rented = shelves.iter().filter(|s| s.is_rented()).count();
    tx.save(Collection::Shelves, &shelves).await?;
    println!("✓ {} branches, {} shelves ({} rented)", BRANCHES.len(), shelves.len(), rented);
    println!("✓ {} owners", OWNERS.len());

    // Inventory
    for row in BOOKS {
        let owner = owner_number(row.owner);
        let info = BookInfo {
            isbn: row.isbn.to_string(),
            title: row.title.to_string(),
            author: row.author.to_string(),
            publisher: row.publisher.to_string(),
            pub_year: Some(row.pub_year.to_string()),
            original_price: Money::won(row.original_price),
        };
        let item = Item::book(row.id, branch_of(row.owner), info, Money::won(row.price), row.condition, day(2024, 9, 1))
            .owned_by(row.owner, owner)
            .on_shelf(row.shelf)
            .with_quantity(row.quantity);
        tx.inventory().insert(item).await?;
    }

    for (id, branch, name, price, quantity, condition, shelf, owner) in GOODS {
        let mut item = Item::goods(*id, *branch, *name, Money::won(*price), *condition, day(2024, 9, 1))
            .with_quantity(*quantity);
        if !shelf.is_empty() {
            item = item.on_shelf(*shelf);
        }
        if let Some(owner) = owner {
            item = item.owned_by(*owner, owner_number(owner));
        }
        tx.inventory().insert(item).await?;
    }
    println!("✓ {} books, {} goods", BOOKS.len(), GOODS.len());

    tx.commit().await?;

    // Sales go through the ledger so balances and the log agree
    let ledger = Ledger::new(db.clone(), Arc::new(NullSink));
    for (category, id, payment, (month, d)) in SALES {
        let item = ItemRef {
            id: id.to_string(),
            category: *category,
        };
        ledger
            .process_sale_at(SaleRequest::new(item, *payment), day(2024, *month, *d))
            .await?;
    }
    println!("✓ {} sales", SALES.len());

    let ring = NotificationRing::new(db.clone(), config.notifications.capacity);
    ring.push(Notification::new(
        NotificationKind::System,
        "포도책방 관리시스템이 오픈되었습니다",
        NotificationTarget::All,
        now,
    ))
    .await?;
    println!("✓ Welcome notification");

    let snapshot = db.store().snapshot().await?;
    println!();
    println!("Verifying...");
    println!(
        "  Available items: {}",
        snapshot.books.iter().chain(&snapshot.goods).filter(|i| i.is_available()).count()
    );
    println!(
        "  Total owner balance: {}",
        snapshot.owners.iter().map(|o| o.balance).sum::<Money>()
    );
    println!("  Balance drift: {} owners", ledger.audit_balances().await?.len());

    db.close().await;
    println!();
    println!("✓ Seed complete");
    Ok(())
}

fn day(year: i32, month: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, d, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn owner_number(owner_id: &str) -> &'static str {
    OWNERS
        .iter()
        .find(|o| o.0 == owner_id)
        .map(|o| o.1)
        .unwrap_or_default()
}

fn branch_of(owner_id: &str) -> &'static str {
    OWNERS
        .iter()
        .find(|o| o.0 == owner_id)
        .map(|o| o.5)
        .unwrap_or_default()
}
