use crate::{
    entities::{branch, chat_message, order},
    errors::ServiceError,
    metrics::BUSINESS_METRICS,
};
use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{AsRefStr, Display};
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 100))]
    pub session_id: String,
    pub branch_id: Option<Uuid>,
    #[validate(length(min = 1, max = 1000))]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatReply {
    pub session_id: String,
    pub intent: String,
    pub reply: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Intent {
    Greeting,
    Menu,
    Hours,
    Address,
    Phone,
    OrderStatus,
    Delivery,
    Thanks,
    Unknown,
}

/// Keyword rules, checked in order. Keywords are matched against the
/// lowercased message.
const RULES: &[(Intent, &[&str])] = &[
    (Intent::Thanks, &["teşekkür", "tesekkur", "sağol", "sagol", "thank"]),
    (Intent::Menu, &["menü", "menu", "yemek", "fiyat", "price", "food"]),
    (Intent::OrderStatus, &["sipariş", "siparis", "order", "status", "durum"]),
    (Intent::Hours, &["saat", "açık", "acik", "kapanış", "hours", "open", "close"]),
    (Intent::Address, &["adres", "nerede", "konum", "address", "where", "location"]),
    (Intent::Phone, &["telefon", "numara", "ara", "phone", "call"]),
    (Intent::Delivery, &["teslimat", "paket", "kurye", "delivery", "deliver"]),
    (Intent::Greeting, &["merhaba", "selam", "günaydın", "iyi akşamlar", "hello", "hi", "hey"]),
];

lazy_static! {
    static ref ORDER_NUMBER: Regex =
        Regex::new(r"(?i)\bORD-[0-9]{6}-[A-Z0-9]{6}\b").expect("valid order number pattern");
}

/// Extracts an order number such as `ORD-240301-7KQ2ZD` from free text.
pub fn find_order_number(text: &str) -> Option<String> {
    ORDER_NUMBER
        .find(text)
        .map(|m| m.as_str().to_uppercase())
}

fn contains_word(haystack: &str, keyword: &str) -> bool {
    // Short keywords only match whole words so "hi" does not fire inside "this"
    if keyword.chars().count() <= 3 {
        haystack
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == keyword)
    } else {
        haystack.contains(keyword)
    }
}

pub fn detect_intent(message: &str) -> Intent {
    if find_order_number(message).is_some() {
        return Intent::OrderStatus;
    }
    let lowered = message.to_lowercase();
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| contains_word(&lowered, k)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Unknown)
}

/// Rule based assistant for the ordering site
#[derive(Clone)]
pub struct ChatbotService {
    db: Arc<DatabaseConnection>,
}

impl ChatbotService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(session_id = %input.session_id))]
    pub async fn handle_message(&self, input: ChatRequest) -> Result<ChatReply, ServiceError> {
        input.validate()?;
        let text = input.message.trim().to_string();

        self.store(&input.session_id, input.branch_id, "user", &text, None)
            .await?;

        let branch = match input.branch_id {
            Some(id) => branch::Entity::find_by_id(id).one(&*self.db).await?,
            None => None,
        };
        let intent = detect_intent(&text);
        let reply = self.reply_for(intent, &text, branch.as_ref()).await?;

        self.store(
            &input.session_id,
            input.branch_id,
            "bot",
            &reply,
            Some(intent.to_string()),
        )
        .await?;
        BUSINESS_METRICS.record_chat_message();
        debug!(%intent, "Chat message answered");

        Ok(ChatReply {
            session_id: input.session_id,
            intent: intent.to_string(),
            reply,
        })
    }

    /// Conversation of a session, oldest first
    #[instrument(skip(self))]
    pub async fn history(&self, session_id: &str) -> Result<Vec<chat_message::Model>, ServiceError> {
        Ok(chat_message::Entity::find()
            .filter(chat_message::Column::SessionId.eq(session_id))
            .order_by_asc(chat_message::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    async fn reply_for(
        &self,
        intent: Intent,
        text: &str,
        branch: Option<&branch::Model>,
    ) -> Result<String, ServiceError> {
        let reply = match intent {
            Intent::Greeting => {
                "Merhaba! Size nasıl yardımcı olabilirim? Menü, çalışma saatleri, adres veya sipariş durumu hakkında soru sorabilirsiniz.".to_string()
            }
            Intent::Thanks => "Rica ederiz, afiyet olsun!".to_string(),
            Intent::Menu => match branch {
                Some(b) => format!(
                    "{} menüsünü sayfadaki menü bölümünden inceleyebilir ve sipariş verebilirsiniz.",
                    b.name
                ),
                None => "Menüyü görmek için lütfen bir şube seçin.".to_string(),
            },
            Intent::Hours => match branch.and_then(|b| b.opening_hours.as_deref()) {
                Some(hours) => format!("Çalışma saatlerimiz: {}", hours),
                None => "Çalışma saatleri için lütfen şubemizle iletişime geçin.".to_string(),
            },
            Intent::Address => match branch {
                Some(b) => format!("{} şubemizin adresi: {}", b.name, b.address),
                None => "Adres bilgisi için lütfen bir şube seçin.".to_string(),
            },
            Intent::Phone => match branch.and_then(|b| b.phone.as_deref()) {
                Some(phone) => format!("Bize {} numarasından ulaşabilirsiniz.", phone),
                None => "Telefon bilgisi için lütfen bir şube seçin.".to_string(),
            },
            Intent::Delivery => match branch {
                Some(b) if b.delivery_enabled => {
                    format!("{} şubemiz paket servis yapmaktadır.", b.name)
                }
                Some(b) => format!("{} şubemiz şu anda paket servis yapmamaktadır.", b.name),
                None => "Paket servis bilgisi için lütfen bir şube seçin.".to_string(),
            },
            Intent::OrderStatus => match find_order_number(text) {
                Some(number) => {
                    let found = order::Entity::find()
                        .filter(order::Column::OrderNumber.eq(number.as_str()))
                        .one(&*self.db)
                        .await?;
                    match found {
                        Some(o) => format!("{} numaralı siparişinizin durumu: {}", number, o.status),
                        None => format!("{} numaralı bir sipariş bulunamadı.", number),
                    }
                }
                None => "Sipariş durumunu sorgulamak için sipariş numaranızı yazın (ör. ORD-240101-ABC123).".to_string(),
            },
            Intent::Unknown => {
                "Üzgünüm, sorunuzu anlayamadım. Menü, çalışma saatleri, adres, telefon veya sipariş durumu hakkında yardımcı olabilirim.".to_string()
            }
        };
        Ok(reply)
    }

    async fn store(
        &self,
        session_id: &str,
        branch_id: Option<Uuid>,
        sender: &str,
        message: &str,
        intent: Option<String>,
    ) -> Result<chat_message::Model, ServiceError> {
        Ok(chat_message::ActiveModel {
            id: Set(Uuid::new_v4()),
            session_id: Set(session_id.to_string()),
            branch_id: Set(branch_id),
            sender: Set(sender.to_string()),
            message: Set(message.to_string()),
            intent: Set(intent),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Merhaba", Intent::Greeting)]
    #[case("hi there", Intent::Greeting)]
    #[case("MENÜDE neler var?", Intent::Menu)]
    #[case("What are your opening hours?", Intent::Hours)]
    #[case("adresiniz nedir", Intent::Address)]
    #[case("telefon numaranız", Intent::Phone)]
    #[case("paket servis var mı", Intent::Delivery)]
    #[case("sipariş durumu", Intent::OrderStatus)]
    #[case("where is ord-240301-abc123", Intent::OrderStatus)]
    #[case("is my order still open?", Intent::OrderStatus)]
    #[case("teşekkürler", Intent::Thanks)]
    #[case("this is fine", Intent::Unknown)]
    fn detects_intents(#[case] message: &str, #[case] expected: Intent) {
        assert_eq!(detect_intent(message), expected);
    }

    #[test]
    fn extracts_order_numbers() {
        assert_eq!(
            find_order_number("Siparişim ORD-240301-7KQ2ZD ne durumda?"),
            Some("ORD-240301-7KQ2ZD".to_string())
        );
        assert_eq!(
            find_order_number("ord-240301-abc123, lütfen"),
            Some("ORD-240301-ABC123".to_string())
        );
        assert_eq!(find_order_number("ORD-1234-ABC"), None);
        assert_eq!(find_order_number("ORD-240301-ABC1234"), None);
        assert_eq!(find_order_number("no number here"), None);
    }
}
