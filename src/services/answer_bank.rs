//! 筛选问题答案库 - 业务能力层
//!
//! 只负责"回答筛选问题 / 提供个人信息"能力，启动时加载一次，运行期间不可变

use phf::phf_set;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{AnswerBankError, AppResult, FileError};
use crate::models::{PersonalInfo, PersonalInfoDraft, ResumeFormat};

/// 必须配置的市场代码
pub static MANDATORY_MARKETS: phf::Set<&'static str> = phf_set! {
    "US", "UK", "CA", "AU", "DE", "FR", "IN",
};

/// 薪资类问题永远交给人工，与答案库内容无关
const ALWAYS_PAUSE_PATTERN: &str =
    r"(?i)salary|compensation|pay (expectation|range|requirement)|expected pay|desired pay";

const DEFAULT_FORMAT_KEY: &str = "default";

/// 答案库文件结构
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerBankFile {
    pub version: String,
    pub personal_info: BTreeMap<String, PersonalInfoDraft>,
    #[serde(default)]
    pub screening_patterns: Vec<PatternEntry>,
    pub resume_formats: BTreeMap<String, ResumeFormat>,
}

/// 一条筛选问题规则：`answer` 与 `action = "pause"` 二选一
#[derive(Debug, Clone, Deserialize)]
pub struct PatternEntry {
    pub pattern: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub action: Option<PatternAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternAction {
    Pause,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RuleAction {
    Answer(String),
    Pause,
}

#[derive(Debug, Clone)]
struct ScreeningRule {
    pattern: String,
    regex: Regex,
    action: RuleAction,
}

/// 筛选问题的回答结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreeningAnswer {
    pub answer: String,
    /// 为 true 时必须暂停等待人工处理
    pub pause: bool,
    pub matched_pattern: Option<String>,
}

impl ScreeningAnswer {
    fn pause(matched_pattern: Option<String>) -> Self {
        Self {
            answer: String::new(),
            pause: true,
            matched_pattern,
        }
    }
}

/// 筛选问题答案库
#[derive(Debug, Clone)]
pub struct AnswerBank {
    version: String,
    personal_info: HashMap<String, PersonalInfo>,
    rules: Vec<ScreeningRule>,
    always_pause: Regex,
    resume_formats: HashMap<String, ResumeFormat>,
}

impl AnswerBank {
    /// 从文件加载答案库
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| FileError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let file: AnswerBankFile =
            toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self::from_file(file)?)
    }

    /// 从解析后的文件结构构建，所有校验都在这里完成
    pub fn from_file(file: AnswerBankFile) -> Result<Self, AnswerBankError> {
        let mut personal_info = HashMap::new();
        for (market, draft) in file.personal_info {
            let market = market.to_uppercase();
            if personal_info.contains_key(&market) {
                return Err(AnswerBankError::DuplicateMarket(market));
            }
            let info = draft
                .validate()
                .map_err(|source| AnswerBankError::InvalidPersonalInfo {
                    market: market.clone(),
                    source,
                })?;
            personal_info.insert(market, info);
        }

        let mut missing: Vec<String> = MANDATORY_MARKETS
            .iter()
            .filter(|code| !personal_info.contains_key(**code))
            .map(|code| code.to_string())
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(AnswerBankError::MissingMarkets(missing));
        }

        let rules = file
            .screening_patterns
            .into_iter()
            .enumerate()
            .map(|(index, entry)| compile_rule(index, entry))
            .collect::<Result<Vec<_>, _>>()?;

        let always_pause =
            Regex::new(ALWAYS_PAUSE_PATTERN).map_err(|e| AnswerBankError::InvalidPattern {
                index: 0,
                pattern: ALWAYS_PAUSE_PATTERN.to_string(),
                reason: e.to_string(),
            })?;

        let resume_formats: HashMap<String, ResumeFormat> = file
            .resume_formats
            .into_iter()
            .map(|(platform, format)| (platform.to_lowercase(), format))
            .collect();
        if !resume_formats.contains_key(DEFAULT_FORMAT_KEY) {
            return Err(AnswerBankError::MissingDefaultFormat);
        }

        Ok(Self {
            version: file.version,
            personal_info,
            rules,
            always_pause,
            resume_formats,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// 获取某个市场的个人信息（不区分大小写）
    pub fn get_personal_info(&self, market: &str) -> Result<&PersonalInfo, AnswerBankError> {
        self.personal_info
            .get(&market.to_uppercase())
            .ok_or_else(|| AnswerBankError::MarketNotFound(market.to_string()))
    }

    /// 回答筛选问题
    ///
    /// 按声明顺序匹配，第一条命中的规则生效。`pause` 规则、未命中、
    /// 以及薪资类问题都返回空答案并要求暂停。
    /// 答案中的 `{city}` 等占位符用指定市场的个人信息替换，无法替换时同样暂停。
    pub fn answer_screening_question(&self, question: &str, market: Option<&str>) -> ScreeningAnswer {
        let normalized = question.trim().to_lowercase();

        if self.always_pause.is_match(&normalized) {
            debug!("薪资类问题，交给人工: {}", question);
            return ScreeningAnswer::pause(Some("salary".to_string()));
        }

        let Some(rule) = self.rules.iter().find(|rule| rule.regex.is_match(&normalized)) else {
            debug!("没有规则匹配该问题，交给人工: {}", question);
            return ScreeningAnswer::pause(None);
        };

        match &rule.action {
            RuleAction::Pause => ScreeningAnswer::pause(Some(rule.pattern.clone())),
            RuleAction::Answer(template) => match self.render_answer(template, market) {
                Some(answer) => ScreeningAnswer {
                    answer,
                    pause: false,
                    matched_pattern: Some(rule.pattern.clone()),
                },
                None => ScreeningAnswer::pause(Some(rule.pattern.clone())),
            },
        }
    }

    /// 获取平台对应的简历格式，未配置的平台使用 default
    pub fn get_resume_format(&self, platform: &str) -> ResumeFormat {
        self.resume_formats
            .get(&platform.to_lowercase())
            .or_else(|| self.resume_formats.get(DEFAULT_FORMAT_KEY))
            .copied()
            .unwrap_or(ResumeFormat::Pdf)
    }

    fn render_answer(&self, template: &str, market: Option<&str>) -> Option<String> {
        if !template.contains('{') {
            return Some(template.to_string());
        }

        let info = match market.map(|m| self.get_personal_info(m)) {
            Some(Ok(info)) => info,
            Some(Err(e)) => {
                warn!("无法渲染答案模板: {}", e);
                return None;
            }
            None => return None,
        };

        let placeholder = Regex::new(r"\{([a-z_]+)\}").ok()?;
        let mut unresolved = false;
        let rendered = placeholder.replace_all(template, |caps: &regex::Captures| {
            info.value_for(&caps[1]).unwrap_or_else(|| {
                unresolved = true;
                String::new()
            })
        });

        if unresolved {
            None
        } else {
            Some(rendered.into_owned())
        }
    }
}

fn compile_rule(index: usize, entry: PatternEntry) -> Result<ScreeningRule, AnswerBankError> {
    let invalid = |reason: String| AnswerBankError::InvalidPattern {
        index,
        pattern: entry.pattern.clone(),
        reason,
    };

    let action = match (&entry.answer, entry.action) {
        (Some(answer), None) => RuleAction::Answer(answer.clone()),
        (None, Some(PatternAction::Pause)) => RuleAction::Pause,
        (Some(_), Some(_)) => return Err(invalid("answer 与 action 不能同时出现".to_string())),
        (None, None) => return Err(invalid("必须声明 answer 或 action".to_string())),
    };

    let regex = Regex::new(&format!("(?i){}", entry.pattern)).map_err(|e| invalid(e.to_string()))?;

    Ok(ScreeningRule {
        pattern: entry.pattern,
        regex,
        action,
    })
}
