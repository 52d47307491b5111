//! Eight workers advancing one shared bar.
//!
//! Run with `RUST_LOG=atomic_bar=debug cargo run --example threads` to see the bar's
//! lifecycle logging.

use std::{thread, time::Duration};

use atomic_bar::{ProgressBar, Theme};

fn main() -> atomic_bar::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let bar = ProgressBar::builder(1_000)
        .label("workers")
        .theme(Theme::ASCII)
        .build();

    thread::scope(|s| {
        for worker in 0..8u64 {
            let bar = &bar;
            s.spawn(move || {
                for _ in 0..125 {
                    thread::sleep(Duration::from_micros(500 + worker * 250));
                    bar.inc();
                }
            });
        }
    });
    bar.finish()?;

    let items: Vec<u64> = (0..200).collect();
    ProgressBar::builder(items.len() as u64)
        .label("for_each")
        .build()
        .for_each_concurrent(&items, 4, |_| thread::sleep(Duration::from_millis(5)))?;

    Ok(())
}
