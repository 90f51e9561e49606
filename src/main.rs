use std::sync::Arc;

use clap::Parser;
use leaderboard_service::{
    args::Args,
    database::{db::DbClient, UserStore},
    model::RankingEngine,
    service::{PageRequest, RankingService},
    utils::progress_utils::indeterminate_bar
};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();

    env_logger::builder().parse_filters(&args.log_level).init();

    log::info!("starting leaderboard service");

    let store = DbClient::connect(&args.database_url)
        .await
        .expect("Database must be reachable");
    store.ensure_schema().await.expect("Users table must be verifiable");

    let engine = Arc::new(RankingEngine::new());

    let bar = indeterminate_bar("Scanning rating counts".to_string());
    engine
        .initialize_from_store(&store)
        .await
        .expect("Ranking engine must initialize");
    bar.finish_with_message("Rating histogram built");

    let stats = engine.stats().expect("Engine must be ready");
    log::info!(
        "ranking engine ready: {} users across {} distinct ratings ({}..={})",
        stats.total_users,
        stats.unique_ratings,
        stats.min_rating,
        stats.max_rating
    );

    let service = RankingService::new(store, Arc::clone(&engine));

    print_top_page(&service).await;

    if args.simulate {
        let persisted = service
            .simulate_bulk(args.simulate_count)
            .await
            .expect("Simulation must complete");
        println!(
            "simulated {} rating updates, {} persisted",
            args.simulate_count, persisted
        );

        print_top_page(&service).await;
    }
}

async fn print_top_page<S: UserStore>(service: &RankingService<S>) {
    let page = service
        .page(PageRequest::Leaderboard, None, None)
        .await
        .expect("Leaderboard page must be served");

    println!("top {}", page.data.len());
    for row in &page.data {
        println!("{}: {} - {}", row.rank, row.username, row.rating);
    }
}
