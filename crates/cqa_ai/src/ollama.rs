use cqa_core::error::AppError;

const LOCAL_PREFIX: &str = "http://127.0.0.1";

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
}

impl OllamaClient {
    /// Create a client for Ollama. Only `http://127.0.0.1[:port]` is accepted.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/').to_string();

        let rest = base_url
            .strip_prefix(LOCAL_PREFIX)
            .ok_or_else(|| remote_not_allowed(&base_url))?;
        if !rest.is_empty() {
            // Only an explicit, in-range port may follow the host.
            let port = rest.strip_prefix(':').ok_or_else(|| remote_not_allowed(&base_url))?;
            let valid = !port.is_empty()
                && port.chars().all(|c| c.is_ascii_digit())
                && matches!(port.parse::<u32>(), Ok(p) if (1..=65535).contains(&p));
            if !valid {
                return Err(remote_not_allowed(&base_url));
            }
        }

        Ok(Self { base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = ureq::get(&url)
            .timeout(std::time::Duration::from_millis(800))
            .call();

        match resp {
            Ok(r) if r.status() == 200 => Ok(()),
            Ok(r) => Err(
                AppError::new("AI_OLLAMA_UNHEALTHY", "Ollama health check failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(e) => Err(AppError::new(
                "AI_OLLAMA_UNREACHABLE",
                "Failed to reach Ollama on 127.0.0.1",
            )
            .with_details(e.to_string())
            .with_retryable(true)),
        }
    }
}

fn remote_not_allowed(base_url: &str) -> AppError {
    AppError::new(
        "AI_REMOTE_NOT_ALLOWED",
        "Ollama base URL must be localhost (127.0.0.1)",
    )
    .with_details(format!("base_url={base_url}"))
}
