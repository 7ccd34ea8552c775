use anyhow::Context;
use clap::Parser;
use docsearch::cli::{Cli, Commands, SearchArgs};
use docsearch::config::{load_search_data, load_synonyms};
use docsearch::search::scoring::ModulePageHit;
use docsearch::worker::{Request, Response, spawn_search_worker};
use docsearch::{Language, SearchConfig, SearchEngine, SearchHit, SynonymTable};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays free for protocol messages
    docsearch::tracing::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Search(args) => run_search(args),
        Commands::Serve => serve().await,
    }
}

fn run_search(args: SearchArgs) -> anyhow::Result<()> {
    let corpus = load_search_data(&args.corpus)?;
    let synonyms = match &args.synonyms {
        Some(path) => load_synonyms(path)?,
        None => SynonymTable::default(),
    };
    let engine = SearchEngine::build(
        corpus,
        Language::from_tag(&args.lang),
        synonyms,
        SearchConfig::default(),
    );

    if args.json {
        let mut outcome = engine.search(&args.query)?;
        outcome.results.truncate(args.limit);
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let ranked = engine.search_ranked(&args.query)?;
    let groups = &ranked.groups;
    if groups.is_empty() {
        println!("No results for '{}'", args.query);
        return Ok(());
    }
    if ranked.highlight_query != args.query.trim() {
        println!("Showing results for '{}'\n", ranked.highlight_query);
    }

    let mut remaining = args.limit;
    for page in groups.modules.iter().take(remaining) {
        print_module_page(page);
    }
    remaining = remaining.saturating_sub(groups.modules.len());

    let hits = groups
        .is_resource_name_match
        .iter()
        .chain(&groups.name_match)
        .chain(&groups.is_resource_other)
        .chain(&groups.parameter_other)
        .chain(&groups.document);
    for hit in hits.take(remaining) {
        print_hit(&engine, hit, &ranked.highlight_query);
    }

    Ok(())
}

fn print_module_page(page: &ModulePageHit) {
    println!("{:>9.3}  module  {}\n           {}", page.score, page.module, page.url);
}

fn print_hit(engine: &SearchEngine, hit: &SearchHit, highlight_query: &str) {
    let Some(entry) = engine.resolve(hit.reference) else {
        return;
    };
    println!(
        "{:>9.3}  {:<8} {}\n           {}",
        hit.score,
        hit.reference.to_string(),
        entry.title(),
        entry.url()
    );
    if let Some(snippet) = engine.snippet(hit.reference, highlight_query)
        && !snippet.is_empty()
    {
        println!("           {}", snippet);
    }
}

/// Bridge stdin/stdout to a search worker, one JSON message per line.
async fn serve() -> anyhow::Result<()> {
    tracing::info!("Serving search worker protocol on stdio");

    let mut worker = spawn_search_worker();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut input_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if input_open => {
                match line.context("Failed to read from stdin")? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => match Request::decode(&line) {
                        Ok(request) => worker.send(request)?,
                        Err(rejection) => {
                            tracing::warn!("Rejected malformed message: {}", line);
                            write_message(&mut stdout, &rejection).await?;
                        }
                    },
                    None => {
                        tracing::debug!("stdin closed, draining search worker");
                        input_open = false;
                        worker.close();
                    }
                }
            }
            response = worker.recv() => match response {
                Some(response) => write_message(&mut stdout, &response).await?,
                None => break,
            },
        }
    }

    Ok(())
}

async fn write_message(stdout: &mut tokio::io::Stdout, response: &Response) -> anyhow::Result<()> {
    let mut line = serde_json::to_vec(response)?;
    line.push(b'\n');
    stdout.write_all(&line).await?;
    stdout.flush().await?;
    Ok(())
}
