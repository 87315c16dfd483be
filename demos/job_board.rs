use std::sync::Arc;

use jobboard_loader::board::resolvers::mutation;
use jobboard_loader::board::views;
use jobboard_loader::board::{
    ApiError, CreateJobInput, JobStore, MemoryStore, RequestContext, StoreError, User,
};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

const SEED: &str = r#"{
    "companies": [
        {"id": "FjcJCHJALA4i", "name": "Facegle", "description": "We are a startup on a mission to disrupt social search engines."},
        {"id": "Gu7QW9LcnF5d", "name": "Goobook", "description": "We are a startup on a mission to disrupt search social media."}
    ],
    "jobs": [
        {"id": "f3YzmnBZpK0o", "companyId": "FjcJCHJALA4i", "title": "Frontend Developer", "createdAt": "2024-01-26T11:00:00.000Z"},
        {"id": "XYZNJMXFax6n", "companyId": "FjcJCHJALA4i", "title": "Backend Developer", "createdAt": "2024-01-27T11:00:00.000Z"},
        {"id": "6mA05AZxvS1R", "companyId": "Gu7QW9LcnF5d", "title": "Full-Stack Developer", "createdAt": "2024-01-30T11:00:00.000Z"}
    ]
}"#;

#[derive(Debug, Error)]
enum DemoError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to render response: {0}")]
    Json(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> Result<(), DemoError> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let store: Arc<dyn JobStore> = Arc::new(MemoryStore::from_json(SEED)?);

    // One context per incoming request.
    let ctx = RequestContext::new(Arc::clone(&store), None);
    let board = views::job_board(&ctx, None, None).await?;
    println!("{}", serde_json::to_string_pretty(&board)?);

    let user = User {
        id: "AcMJpL7b413Z".to_owned(),
        company_id: "FjcJCHJALA4i".to_owned(),
        email: "alice@facegle.com".to_owned(),
    };
    let ctx = RequestContext::new(Arc::clone(&store), Some(user));
    let input = CreateJobInput {
        title: "Site Reliability Engineer".to_owned(),
        description: Some("Keep the lights on.".to_owned()),
    };
    let job = mutation::create_job(&ctx, input).await?;
    println!("{}", serde_json::to_string_pretty(&views::job_detail(&ctx, &job.id).await?)?);

    let ctx = RequestContext::new(store, None);
    let company = views::company_detail(&ctx, "FjcJCHJALA4i").await?;
    println!("{}", serde_json::to_string_pretty(&company)?);

    Ok(())
}
