//! HTTP gateway over the reference-data providers.

use crate::cache::QueryCache;
use crate::error::KnowledgeError;
use crate::types::{
    Article, ConditionCode, DocumentText, DrugConcept, DrugFacts, KnowledgeClient,
    KnowledgeOutcome, KnowledgePayload, KnowledgeQuery, KnowledgeQueryResult,
};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;
use vitalis_config::KnowledgeConfig;

/// Gateway executing provider queries over HTTP.
///
/// Each call is bounded by the configured timeout and retried at most
/// once on transient transport failure; exhaustion yields an
/// `unavailable` result rather than an error.
pub struct KnowledgeGateway {
    http: reqwest::Client,
    config: KnowledgeConfig,
    cache: QueryCache,
}

impl KnowledgeGateway {
    /// Build a gateway from config.
    pub fn new(config: KnowledgeConfig) -> Result<Self, KnowledgeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| KnowledgeError::Transport(err.to_string()))?;
        info!(
            "initialized knowledge gateway (timeout_ms={}, cache_ttl_secs={})",
            config.timeout_ms, config.cache_ttl_secs
        );
        let cache = QueryCache::new(Duration::from_secs(config.cache_ttl_secs));
        Ok(Self {
            http,
            config,
            cache,
        })
    }

    /// GET a JSON document, retrying once on transient transport failure.
    async fn fetch_json(&self, url: &str, params: &[(&str, String)]) -> Result<Value, KnowledgeError> {
        let mut last_err = None;
        for attempt in 0..2 {
            match self.fetch_json_once(url, params).await {
                Ok(value) => return Ok(value),
                Err(err @ KnowledgeError::Transport(_)) if attempt == 0 => {
                    debug!("transient provider failure, retrying once (url={url})");
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or(KnowledgeError::NoResults))
    }

    async fn fetch_json_once(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<Value, KnowledgeError> {
        let response = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|err| KnowledgeError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(KnowledgeError::Status(status.as_u16()));
        }
        response
            .json::<Value>()
            .await
            .map_err(|err| KnowledgeError::Decode(err.to_string()))
    }

    async fn run_query(&self, query: &KnowledgeQuery) -> Result<KnowledgePayload, KnowledgeError> {
        match query {
            KnowledgeQuery::DrugFacts { name } => self.drug_facts(name).await,
            KnowledgeQuery::StandardizedDrugName { name } => self.drug_concepts(name).await,
            KnowledgeQuery::DrugInteractions { name } => self.drug_interactions(name).await,
            KnowledgeQuery::LiteratureSearch { query, max_results } => {
                self.literature(query, *max_results).await
            }
            KnowledgeQuery::ConditionCodes { term } => self.condition_codes(term).await,
            KnowledgeQuery::DocumentTextExtraction { document_id } => {
                self.document_text(*document_id).await
            }
        }
    }

    async fn drug_facts(&self, name: &str) -> Result<KnowledgePayload, KnowledgeError> {
        let search = format!(
            "openfda.brand_name:\"{name}\" OR openfda.generic_name:\"{name}\""
        );
        let value = self
            .fetch_json(
                &self.config.endpoints.drug_label,
                &[("search", search), ("limit", "1".to_string())],
            )
            .await?;
        parse_drug_facts(&value).map(KnowledgePayload::DrugFacts)
    }

    async fn drug_concepts(&self, name: &str) -> Result<KnowledgePayload, KnowledgeError> {
        let value = self
            .fetch_json(&self.config.endpoints.rxnorm, &[("name", name.to_string())])
            .await?;
        parse_drug_concepts(&value).map(KnowledgePayload::DrugConcepts)
    }

    async fn drug_interactions(&self, name: &str) -> Result<KnowledgePayload, KnowledgeError> {
        let search = format!("openfda.brand_name:\"{name}\" AND _exists_:drug_interactions");
        let value = self
            .fetch_json(
                &self.config.endpoints.drug_label,
                &[("search", search), ("limit", "1".to_string())],
            )
            .await?;
        parse_interactions(&value).map(|text| KnowledgePayload::Interactions { text })
    }

    async fn literature(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<KnowledgePayload, KnowledgeError> {
        let search = self
            .fetch_json(
                &self.config.endpoints.pubmed_search,
                &[
                    ("db", "pubmed".to_string()),
                    ("term", query.to_string()),
                    ("retmax", max_results.to_string()),
                    ("retmode", "json".to_string()),
                ],
            )
            .await?;
        let ids = parse_article_ids(&search)?;
        if ids.is_empty() {
            return Err(KnowledgeError::NoResults);
        }
        let summary = self
            .fetch_json(
                &self.config.endpoints.pubmed_summary,
                &[
                    ("db", "pubmed".to_string()),
                    ("id", ids.join(",")),
                    ("retmode", "json".to_string()),
                ],
            )
            .await?;
        parse_articles(&summary, &ids).map(KnowledgePayload::Literature)
    }

    async fn condition_codes(&self, term: &str) -> Result<KnowledgePayload, KnowledgeError> {
        let value = self
            .fetch_json(
                &self.config.endpoints.condition_codes,
                &[
                    ("sf", "code,name".to_string()),
                    ("terms", term.to_string()),
                    ("maxList", "5".to_string()),
                ],
            )
            .await?;
        parse_condition_codes(&value).map(KnowledgePayload::ConditionCodes)
    }

    async fn document_text(&self, document_id: Uuid) -> Result<KnowledgePayload, KnowledgeError> {
        let value = self
            .fetch_json(
                &self.config.endpoints.document_text,
                &[("document", document_id.to_string())],
            )
            .await?;
        parse_document_text(&value).map(KnowledgePayload::DocumentText)
    }
}

#[async_trait]
impl KnowledgeClient for KnowledgeGateway {
    async fn query(&self, query: KnowledgeQuery) -> KnowledgeQueryResult {
        let provider = query.provider();
        let key = query.cache_key();
        if let Some(cached) = self.cache.get(&key) {
            debug!("knowledge cache hit (key={key})");
            return cached;
        }
        match self.run_query(&query).await {
            Ok(payload) => {
                // A pending document extraction is expected to change
                // soon; caching it would mask completion for the TTL.
                let cacheable =
                    !matches!(payload, KnowledgePayload::DocumentText(DocumentText::Pending));
                let result = KnowledgeQueryResult::available(provider, payload);
                if cacheable {
                    self.cache.insert(key, result.clone());
                }
                result
            }
            Err(err) => {
                warn!(
                    "provider unavailable (provider={}, reason={err})",
                    provider.as_str()
                );
                KnowledgeQueryResult::unavailable(provider, err.to_string())
            }
        }
    }
}

/// First element of an OpenFDA string-array field.
fn label_field(result: &Value, field: &str) -> Option<String> {
    result
        .get(field)
        .and_then(|value| value.get(0))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// First element of an `openfda` name array.
fn openfda_field(result: &Value, field: &str) -> Option<String> {
    result
        .get("openfda")
        .and_then(|value| value.get(field))
        .and_then(|value| value.get(0))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn first_label_result(value: &Value) -> Result<&Value, KnowledgeError> {
    value
        .get("results")
        .and_then(|results| results.get(0))
        .ok_or(KnowledgeError::NoResults)
}

fn parse_drug_facts(value: &Value) -> Result<DrugFacts, KnowledgeError> {
    let result = first_label_result(value)?;
    Ok(DrugFacts {
        brand_name: openfda_field(result, "brand_name"),
        generic_name: openfda_field(result, "generic_name"),
        purpose: label_field(result, "purpose"),
        warnings: label_field(result, "warnings"),
        active_ingredient: label_field(result, "active_ingredient"),
        dosage: label_field(result, "dosage_and_administration"),
        adverse_reactions: label_field(result, "adverse_reactions"),
    })
}

fn parse_interactions(value: &Value) -> Result<String, KnowledgeError> {
    let result = first_label_result(value)?;
    label_field(result, "drug_interactions").ok_or(KnowledgeError::NoResults)
}

fn parse_drug_concepts(value: &Value) -> Result<Vec<DrugConcept>, KnowledgeError> {
    const MAX_CONCEPTS: usize = 5;
    let groups = value
        .get("drugGroup")
        .and_then(|group| group.get("conceptGroup"))
        .and_then(Value::as_array)
        .ok_or(KnowledgeError::NoResults)?;
    let mut concepts = Vec::new();
    for group in groups {
        let Some(properties) = group.get("conceptProperties").and_then(Value::as_array) else {
            continue;
        };
        for concept in properties {
            let Some(rxcui) = concept.get("rxcui").and_then(Value::as_str) else {
                continue;
            };
            let Some(name) = concept.get("name").and_then(Value::as_str) else {
                continue;
            };
            concepts.push(DrugConcept {
                rxcui: rxcui.to_string(),
                name: name.to_string(),
                tty: concept
                    .get("tty")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
            if concepts.len() == MAX_CONCEPTS {
                return Ok(concepts);
            }
        }
    }
    if concepts.is_empty() {
        return Err(KnowledgeError::NoResults);
    }
    Ok(concepts)
}

fn parse_article_ids(value: &Value) -> Result<Vec<String>, KnowledgeError> {
    let ids = value
        .get("esearchresult")
        .and_then(|result| result.get("idlist"))
        .and_then(Value::as_array)
        .ok_or_else(|| KnowledgeError::Decode("missing esearchresult.idlist".to_string()))?;
    Ok(ids
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}

fn parse_articles(value: &Value, ids: &[String]) -> Result<Vec<Article>, KnowledgeError> {
    let result = value
        .get("result")
        .ok_or_else(|| KnowledgeError::Decode("missing result map".to_string()))?;
    let mut articles = Vec::new();
    for id in ids {
        let Some(info) = result.get(id.as_str()) else {
            continue;
        };
        articles.push(Article {
            pmid: id.clone(),
            title: info
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("No title")
                .to_string(),
            source: info
                .get("source")
                .and_then(Value::as_str)
                .map(str::to_string),
            pubdate: info
                .get("pubdate")
                .and_then(Value::as_str)
                .map(str::to_string),
            url: format!("https://pubmed.ncbi.nlm.nih.gov/{id}/"),
        });
    }
    if articles.is_empty() {
        return Err(KnowledgeError::NoResults);
    }
    Ok(articles)
}

fn parse_condition_codes(value: &Value) -> Result<Vec<ConditionCode>, KnowledgeError> {
    // Clinical Tables answers as a positional array; index 3 holds
    // [code, name] pairs.
    let rows = value.get(3).and_then(Value::as_array).ok_or(KnowledgeError::NoResults)?;
    let codes: Vec<ConditionCode> = rows
        .iter()
        .filter_map(|row| {
            let code = row.get(0).and_then(Value::as_str)?;
            let description = row.get(1).and_then(Value::as_str)?;
            Some(ConditionCode {
                code: code.to_string(),
                description: description.to_string(),
            })
        })
        .collect();
    if codes.is_empty() {
        return Err(KnowledgeError::NoResults);
    }
    Ok(codes)
}

fn parse_document_text(value: &Value) -> Result<DocumentText, KnowledgeError> {
    if value
        .get("IsErroredOnProcessing")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        let reason = value
            .get("ErrorMessage")
            .and_then(|msg| msg.get(0))
            .and_then(Value::as_str)
            .unwrap_or("extraction failed");
        return Err(KnowledgeError::Decode(reason.to_string()));
    }
    let Some(pages) = value.get("ParsedResults").and_then(Value::as_array) else {
        return Ok(DocumentText::Pending);
    };
    let text = pages
        .iter()
        .filter_map(|page| page.get("ParsedText").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("\n");
    if text.trim().is_empty() {
        return Ok(DocumentText::Pending);
    }
    Ok(DocumentText::Ready(text.trim().to_string()))
}
