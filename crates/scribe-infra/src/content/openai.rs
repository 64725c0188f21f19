//! Chat-completions client for any OpenAI-compatible endpoint.
//!
//! Every request asks for a JSON object and the reply is decoded into a
//! small response struct per prompt.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use scribe_core::domain::Category;
use scribe_core::ports::{
    BlogContext, ContentError, ContentGenerator, GeneratedPost, TitleGroup, TitleSuggestion,
};

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl OpenAiConfig {
    /// `None` when `OPENAI_API_KEY` is unset; seeding is then disabled.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())?;

        Some(Self {
            api_key,
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-5-mini".to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TitleSuggestions {
    suggestions: Vec<CategoryTitles>,
}

#[derive(Debug, Deserialize)]
struct CategoryTitles {
    category: String,
    titles: Vec<TitleSuggestion>,
}

#[derive(Debug, Deserialize)]
struct PostBody {
    content: String,
    description: String,
    #[serde(default)]
    tags: Vec<String>,
    slug: String,
}

#[derive(Debug, Deserialize)]
struct ImagePrompt {
    prompt: String,
}

pub struct OpenAiContentGenerator {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiContentGenerator {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn complete<T: DeserializeOwned>(&self, prompt: String) -> Result<T, ContentError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "response_format": { "type": "json_object" },
        });

        let response = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ContentError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ContentError::Request(format!("{status}: {text}")));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ContentError::InvalidResponse(e.to_string()))?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ContentError::InvalidResponse("empty completion".to_string()))?;

        parse_reply(&content)
    }
}

fn parse_reply<T: DeserializeOwned>(content: &str) -> Result<T, ContentError> {
    serde_json::from_str(content).map_err(|e| ContentError::InvalidResponse(e.to_string()))
}

fn existing_posts(context: &BlogContext) -> String {
    if context.existing_titles.is_empty() {
        return "No existing posts.".to_string();
    }
    context
        .existing_titles
        .iter()
        .zip(&context.existing_slugs)
        .map(|(title, slug)| format!("- {title} | Slug: /blog/{slug}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn titles_prompt(context: &BlogContext) -> String {
    let categories = context
        .categories
        .iter()
        .map(|c| format!("- {}: {}", c.name, c.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You plan articles for the blog \"{}\".\n\
         Categories:\n{categories}\n\n\
         Existing posts:\n{}\n\n\
         Suggest new post titles that do not repeat existing posts. Reply with JSON \
         {{\"suggestions\": [{{\"category\": <category name>, \"titles\": \
         [{{\"title\": string, \"slug\": string}}]}}]}}.",
        context.blog_title,
        existing_posts(context),
    )
}

fn post_prompt(context: &BlogContext, category: &Category, title: &str) -> String {
    let tags = if context.tag_names.is_empty() {
        "No tags available.".to_string()
    } else {
        context.tag_names.join(", ")
    };

    format!(
        "Write a markdown blog post titled \"{title}\" for the category \"{}\" of the blog \"{}\".\n\
         Available tags: {tags}\n\n\
         Existing posts:\n{}\n\n\
         Reply with JSON {{\"content\": string, \"description\": string, \
         \"tags\": [tag names from the available tags], \"slug\": string}}.",
        category.name,
        context.blog_title,
        existing_posts(context),
    )
}

fn image_prompt(content: &str) -> String {
    format!(
        "Describe a hero image for the following blog post as a single prompt for an \
         image model. Reply with JSON {{\"prompt\": string}}.\n\n{content}"
    )
}

/// Resolve category names (case-insensitive) to ids. Unknown categories are dropped.
fn group_titles(context: &BlogContext, suggestions: TitleSuggestions) -> Vec<TitleGroup> {
    suggestions
        .suggestions
        .into_iter()
        .filter_map(|group| {
            let category = context
                .categories
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(group.category.trim()));
            match category {
                Some(category) => Some(TitleGroup {
                    category_id: category.id,
                    titles: group.titles,
                }),
                None => {
                    tracing::warn!(category = %group.category, "Generator suggested an unknown category");
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl ContentGenerator for OpenAiContentGenerator {
    async fn generate_titles(&self, context: &BlogContext) -> Result<Vec<TitleGroup>, ContentError> {
        let suggestions: TitleSuggestions = self.complete(titles_prompt(context)).await?;
        Ok(group_titles(context, suggestions))
    }

    async fn generate_post_body(
        &self,
        context: &BlogContext,
        category: &Category,
        title: &str,
    ) -> Result<GeneratedPost, ContentError> {
        let body: PostBody = self.complete(post_prompt(context, category, title)).await?;
        if body.content.trim().is_empty() {
            return Err(ContentError::InvalidResponse("empty post content".to_string()));
        }

        Ok(GeneratedPost {
            content: body.content,
            description: body.description,
            tag_names: body.tags,
            slug: body.slug,
        })
    }

    async fn generate_image_prompt(&self, content: &str) -> Result<String, ContentError> {
        let reply: ImagePrompt = self.complete(image_prompt(content)).await?;
        Ok(reply.prompt)
    }
}
