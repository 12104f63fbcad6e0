//! Fixed prompt templates for the analysis sections and company lookup
//!
//! Templates are Jinja (minijinja) sources compiled once per [`PromptSet`].
//! Every analysis prompt asks for a bare JSON object written in Traditional
//! Chinese.

use crate::directory::CompanyRecord;
use crate::error::Result;
use crate::factors::FactorMap;
use crate::market::MarketSnapshot;
use minijinja::Environment;
use serde_json::{Value, json};

pub const MARKET: &str = "market";
pub const TECHNICAL: &str = "technical";
pub const TECHNICAL_GENERAL: &str = "technical_general";
pub const RISK: &str = "risk";
pub const INVESTMENT: &str = "investment";
pub const COMPANY_LOOKUP: &str = "company_lookup";

/// System prompt shared by every analysis section
pub const ANALYST_SYSTEM_PROMPT: &str = "你是一位專業的台灣股市分析師。\
請只輸出一個有效的 JSON 物件，不要包含 Markdown、程式碼區塊或任何額外文字。";

const MARKET_TEMPLATE: &str = r#"任務：請使用繁體中文，分析 {{ company.name }} ({{ company.ticker }}) 的市場數據。
規則：嚴格以 JSON 格式返回分析結果，不要包含任何 Markdown 或其他非 JSON 字元。

市場數據（{{ period }}）：
- 最新價格: {{ latest_price }}
- 期間漲跌幅: {{ price_change }}
- 平均成交量: {{ average_volume }}
- 價格波動率: {{ volatility }}

請根據以下結構返回 JSON：
{
  "trend_analysis": "...",
  "volume_analysis": "...",
  "volatility_assessment": "...",
  "technical_insights": "...",
  "investment_suggestion": "..."
}"#;

const TECHNICAL_TEMPLATE: &str = r#"任務：基於以下技術因子數據，對 {{ company.name }} ({{ company.ticker }}) 進行技術分析。
規則：嚴格以 JSON 格式返回分析結果，使用繁體中文，不要包含任何 Markdown。

技術因子：
{% for factor in factors %}- {{ factor.name }}: {{ factor.value }}
{% endfor %}
請根據以下結構返回 JSON：
{
  "momentum_analysis": "...",
  "volatility_assessment": "...",
  "signal_interpretation": "...",
  "trading_point_suggestion": "..."
}"#;

const TECHNICAL_GENERAL_TEMPLATE: &str = r#"任務：對 {{ company.name }} ({{ company.ticker }}) 進行一般性技術分析。
請考慮其產業地位、主要產品、市場競爭格局以及總體經濟因素。
規則：嚴格以 JSON 格式返回分析結果，使用繁體中文，不要包含任何 Markdown。

請根據以下結構返回 JSON：
{
  "general_analysis": "..."
}"#;

const RISK_TEMPLATE: &str = r#"任務：對 {{ company.name }} ({{ company.ticker }}) 股票進行風險評估。
規則：嚴格以 JSON 格式返回分析結果，使用繁體中文，不要包含任何 Markdown。

市場數據：
- 當前價格: {{ latest_price }}
- 期間波動率: {{ volatility }}

請結合公司的具體情況和普遍性風險進行評估，並根據以下結構返回 JSON：
{
  "overall_risk_level": "...",
  "main_risk_factors": [],
  "mitigation_suggestions": "...",
  "stop_loss_suggestion": "..."
}"#;

const INVESTMENT_TEMPLATE: &str = r#"任務：基於以上所有分析，為 {{ company.name }} ({{ company.ticker }}) 提供綜合投資建議。
規則：嚴格以 JSON 格式返回分析結果，使用繁體中文，不要包含任何 Markdown。

當前股價: {{ latest_price }}

請綜合所有資訊，並根據以下結構返回 JSON：
{
  "rating": "買入/持有/賣出",
  "target_price": "...",
  "timeline_suggestion": "...",
  "positioning_suggestion": "..."
}"#;

const COMPANY_LOOKUP_TEMPLATE: &str = r#"以下是台灣上市櫃公司清單，每行格式為「代號: 名稱」：
{% for company in companies %}{{ company.ticker }}: {{ company.name }}
{% endfor %}
使用者查詢：「{{ query }}」

請從清單中找出使用者查詢所指的公司，只回覆該公司的代號（例如 2330.TW）。
如果清單中沒有符合的公司，只回覆 NULL。不要輸出任何其他文字。"#;

/// Compiled prompt templates
pub struct PromptSet {
    env: Environment<'static>,
}

impl PromptSet {
    /// Compile the built-in templates
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template(MARKET, MARKET_TEMPLATE)?;
        env.add_template(TECHNICAL, TECHNICAL_TEMPLATE)?;
        env.add_template(TECHNICAL_GENERAL, TECHNICAL_GENERAL_TEMPLATE)?;
        env.add_template(RISK, RISK_TEMPLATE)?;
        env.add_template(INVESTMENT, INVESTMENT_TEMPLATE)?;
        env.add_template(COMPANY_LOOKUP, COMPANY_LOOKUP_TEMPLATE)?;
        Ok(Self { env })
    }

    /// Render a template by name
    pub fn render(&self, name: &str, context: &Value) -> Result<String> {
        let template = self.env.get_template(name)?;
        Ok(template.render(context)?)
    }

    pub fn market(&self, company: &CompanyRecord, snapshot: &MarketSnapshot) -> Result<String> {
        self.render(MARKET, &snapshot_context(company, snapshot))
    }

    /// Factor-based prompt, or the general one when no factor is available
    pub fn technical(&self, company: &CompanyRecord, factors: &FactorMap) -> Result<String> {
        if factors.is_empty() {
            return self.render(TECHNICAL_GENERAL, &json!({ "company": company_value(company) }));
        }

        let factors: Vec<Value> = factors
            .iter()
            .map(|(name, value)| json!({ "name": name, "value": format!("{value:.4}") }))
            .collect();
        self.render(
            TECHNICAL,
            &json!({ "company": company_value(company), "factors": factors }),
        )
    }

    pub fn risk(&self, company: &CompanyRecord, snapshot: &MarketSnapshot) -> Result<String> {
        self.render(RISK, &snapshot_context(company, snapshot))
    }

    pub fn investment(&self, company: &CompanyRecord, snapshot: &MarketSnapshot) -> Result<String> {
        self.render(INVESTMENT, &snapshot_context(company, snapshot))
    }

    pub fn company_lookup(&self, query: &str, companies: &[CompanyRecord]) -> Result<String> {
        let companies: Vec<Value> = companies.iter().map(company_value).collect();
        self.render(COMPANY_LOOKUP, &json!({ "query": query, "companies": companies }))
    }
}

fn company_value(company: &CompanyRecord) -> Value {
    json!({ "ticker": company.ticker, "name": company.name })
}

fn snapshot_context(company: &CompanyRecord, snapshot: &MarketSnapshot) -> Value {
    json!({
        "company": company_value(company),
        "period": format!(
            "{} 至 {}，共 {} 個交易日",
            snapshot.period_start.format("%Y-%m-%d"),
            snapshot.period_end.format("%Y-%m-%d"),
            snapshot.trading_days
        ),
        "latest_price": format!("NT${:.2}", snapshot.latest_price),
        "price_change": format!("{:.2}%", snapshot.price_change_pct),
        "average_volume": format!("{:.0}", snapshot.average_volume),
        "volatility": snapshot
            .annualized_volatility_pct
            .map_or_else(|| "資料不足".to_string(), |v| format!("{v:.2}%")),
    })
}
