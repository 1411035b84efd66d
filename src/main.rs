use anyhow::Result;
use rscrape::{init_tracing_once, Credentials, HttpApi, ScrapeOptions, Scraper};

fn main() -> Result<()> {
    // A missing .env is fine; real env vars still apply.
    let _ = dotenvy::dotenv();
    init_tracing_once();

    let creds = Credentials::from_env();
    let opts = ScrapeOptions::from_env()?;
    let api = HttpApi::new(creds)?;

    let scraper = Scraper::new(api)
        .options(opts)
        .progress_label("Scraping");

    // Not fatal: listing calls will fail on their own if this did.
    let _ = scraper.authenticate();

    let summary = scraper.run()?;
    println!(
        "Wrote {} rows for {} posts in {} batches to {}",
        summary.rows_written,
        summary.posts,
        summary.batches,
        scraper.opts().output.display()
    );
    Ok(())
}
