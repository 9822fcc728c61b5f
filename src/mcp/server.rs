use std::sync::Arc;

use rmcp::{
    handler::server::tool::ToolRouter,
    handler::server::wrapper::{Json, Parameters},
    model::*,
    tool, tool_handler, tool_router, Peer, RoleServer, ServerHandler, ServiceExt,
};
use tracing::instrument;

use crate::mcp::error::ToolError;
use crate::mcp::progress::make_mcp_progress;
use crate::mcp::{AnalyzePostInput, AnalyzePostResponse, ListPostsInput, ListPostsResponse};
use crate::services::{AnalysisService, ProgressReporter};
use crate::source::normalize_community;

/// MCP server exposing subreddit sentiment analysis.
#[derive(Clone)]
pub struct SubpulseServer {
    pub(crate) analysis: Arc<AnalysisService>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl SubpulseServer {
    pub fn new(analysis: Arc<AnalysisService>) -> Self {
        Self {
            analysis,
            tool_router: Self::tool_router(),
        }
    }

    pub fn from_context(ctx: &crate::init::AppContext) -> Self {
        Self::new(ctx.analysis.clone())
    }

    #[tool(
        description = "List the current hot posts of a subreddit with how many comments were fetched for each. Use the titles with analyze_post."
    )]
    #[instrument(name = "mcp.list_posts", skip_all)]
    pub async fn list_posts(
        &self,
        request: Parameters<ListPostsInput>,
    ) -> Result<Json<ListPostsResponse>, ToolError> {
        let Parameters(input) = request;
        let community = normalize_community(&input.subreddit)?;
        if input.refresh.unwrap_or(false) {
            self.analysis.invalidate(&community).await?;
        }
        let posts = self.analysis.posts(&community).await?;
        if posts.is_empty() {
            return Err(crate::SubpulseError::EmptyInput.into());
        }
        Ok(Json(ListPostsResponse { community, posts }))
    }

    #[tool(
        description = "Classify the comments of one post as positive, neutral or negative and return counts, percentages and the dominant sentiment. Defaults to the first hot post."
    )]
    #[instrument(name = "mcp.analyze_post", skip_all)]
    pub async fn analyze_post(
        &self,
        request: Parameters<AnalyzePostInput>,
        meta: Meta,
        client: Peer<RoleServer>,
    ) -> Result<Json<AnalyzePostResponse>, ToolError> {
        let Parameters(input) = request;
        let progress = make_mcp_progress(&meta, &client);
        self.handle_analyze_post(input, progress).await.map(Json)
    }
}

impl SubpulseServer {
    /// Fetch (or reuse the cached listing), then classify one post.
    ///
    /// Reports two progress steps: fetching, then classifying.
    pub async fn handle_analyze_post(
        &self,
        input: AnalyzePostInput,
        progress: Arc<dyn ProgressReporter>,
    ) -> Result<AnalyzePostResponse, ToolError> {
        if input.refresh.unwrap_or(false) {
            self.analysis.invalidate(&input.subreddit).await?;
        }

        progress
            .step(0, 2, &format!("Fetching comments from r/{}", input.subreddit))
            .await;
        // Warms the cache so the analysis below only classifies
        self.analysis.comments(&input.subreddit).await?;

        progress.step(1, 2, "Classifying comments").await;
        let analysis = self
            .analysis
            .analyze(&input.subreddit, input.post_title.as_deref())
            .await?;
        progress.step(2, 2, "Analysis complete").await;

        let results = input
            .include_comments
            .unwrap_or(false)
            .then_some(analysis.results);
        Ok(AnalyzePostResponse {
            community: analysis.community,
            post_title: analysis.post_title,
            report: analysis.report,
            results,
        })
    }
}

#[tool_handler]
impl ServerHandler for SubpulseServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "subpulse".to_string(),
                title: Some("Subreddit Sentiment".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                r#"# Subpulse

Sentiment of Reddit comment threads.

- list_posts(subreddit, refresh?): hot posts and their comment counts
- analyze_post(subreddit, post_title?, include_comments?, refresh?): positive/neutral/negative distribution for one post

Listings are cached for a few minutes per subreddit; pass refresh=true to fetch again. A NO_DATA error means the subreddit is private, restricted, missing, or has no comments."#
                    .to_string(),
            ),
        }
    }
}

/// Run MCP server on stdio transport.
pub async fn run_mcp_server(ctx: crate::init::AppContext) -> anyhow::Result<()> {
    let server = SubpulseServer::from_context(&ctx);

    tracing::info!("Starting subpulse MCP server v{}", env!("CARGO_PKG_VERSION"));

    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let service = server.serve(transport).await?;
    tracing::info!("MCP server listening on stdio (2 tools)");

    service.waiting().await?;
    tracing::info!("MCP server shutting down");
    Ok(())
}
