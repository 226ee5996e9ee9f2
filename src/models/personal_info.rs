use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 个人信息校验错误，带出错的字段名
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersonalInfoError {
    #[error("email 不合法: '{0}' (不能为空且必须包含 @)")]
    InvalidEmail(String),
    #[error("phone 不合法: '{0}' (长度至少为 5)")]
    InvalidPhone(String),
}

/// 某个市场下用于填写表单的个人信息
///
/// 反序列化时同样会经过 [`PersonalInfo::new`] 的校验
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PersonalInfoDraft")]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

/// 未经校验的个人信息，来自配置文件
#[derive(Debug, Clone, Deserialize)]
pub struct PersonalInfoDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub country: String,
}

impl PersonalInfoDraft {
    pub fn validate(self) -> Result<PersonalInfo, PersonalInfoError> {
        PersonalInfo::new(
            self.first_name,
            self.last_name,
            self.email,
            self.phone,
            self.city,
            self.state,
            self.zip,
            self.country,
        )
    }
}

impl TryFrom<PersonalInfoDraft> for PersonalInfo {
    type Error = PersonalInfoError;

    fn try_from(draft: PersonalInfoDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl PersonalInfo {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        zip: impl Into<String>,
        country: impl Into<String>,
    ) -> Result<Self, PersonalInfoError> {
        let email = email.into();
        if email.trim().is_empty() || !email.contains('@') {
            return Err(PersonalInfoError::InvalidEmail(email));
        }

        let phone = phone.into();
        if phone.trim().chars().count() < 5 {
            return Err(PersonalInfoError::InvalidPhone(phone));
        }

        Ok(Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email,
            phone,
            city: city.into(),
            state: state.into(),
            zip: zip.into(),
            country: country.into(),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// 按表单字段名取值，未知字段返回 None
    pub fn value_for(&self, field: &str) -> Option<String> {
        let value = match field {
            "first_name" => self.first_name.clone(),
            "last_name" => self.last_name.clone(),
            "full_name" => self.full_name(),
            "email" => self.email.clone(),
            "phone" => self.phone.clone(),
            "city" => self.city.clone(),
            "state" => self.state.clone(),
            "zip" => self.zip.clone(),
            "country" => self.country.clone(),
            "location" => format!("{}, {}", self.city, self.state),
            _ => return None,
        };
        Some(value)
    }
}
