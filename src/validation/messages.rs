// User-facing validation messages (pt-BR), shared by the transfer and fee schemas
//
// Numan Thabit 2025 Nov

pub const SOURCE_ACCOUNT_REQUIRED: &str = "Conta de origem é obrigatória";
pub const SOURCE_ACCOUNT_FORMAT: &str = "Conta de origem deve ter exatamente 10 dígitos";
pub const DESTINATION_ACCOUNT_REQUIRED: &str = "Conta de destino é obrigatória";
pub const DESTINATION_ACCOUNT_FORMAT: &str = "Conta de destino deve ter exatamente 10 dígitos";
pub const AMOUNT_TOO_LOW: &str = "Valor deve ser maior que zero";
pub const AMOUNT_TOO_HIGH: &str = "Valor muito alto";
pub const DATE_REQUIRED: &str = "Data da transferência é obrigatória";
pub const DATE_INVALID: &str = "Data da transferência inválida";
pub const DATE_IN_PAST: &str = "Data da transferência não pode ser anterior à data atual";
