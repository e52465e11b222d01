use crate::domain::model::{CanonicalTicket, CodeWhitelist};
use crate::utils::error::{Result, TicketError};

/// 檢查票號是否在授權清單內
///
/// 缺少票號一律失敗；清單為空時接受任何非空票號
pub fn validate(ticket: &CanonicalTicket, whitelist: &CodeWhitelist) -> Result<()> {
    ticket.code().ok_or(TicketError::MissingCodeError)?;
    check_authorized(ticket, whitelist)
}

/// 只檢查白名單成員資格；白名單為空時一律通過，無票號亦不視為錯誤
pub fn check_authorized(ticket: &CanonicalTicket, whitelist: &CodeWhitelist) -> Result<()> {
    if whitelist.is_empty() {
        return Ok(());
    }

    match ticket.code() {
        Some(code) if whitelist.contains(code) => Ok(()),
        code => Err(TicketError::UnauthorizedCodeError {
            code: code.unwrap_or_default().to_string(),
        }),
    }
}
