//! The fixed extraction instruction sent with every image.

/// Instruction asking for the six nameplate items as a JSON object.
///
/// The keys used here are the primary keys recognized by the field mapper.
pub const EXTRACTION_PROMPT: &str = "\
この画像はエアコンの銘板です。画像から次の項目を読み取ってください。
- 型番
- 製造年
- 定格冷房能力（単位付き）
- 定格暖房能力（標準と低温を区別し、単位付き）
- 定格冷房消費電力（単位付き）
- 定格暖房消費電力（単位付き）

回答は説明を付けず、次のキーだけを持つJSONオブジェクトで返してください。
読み取れない項目は null にしてください。
{\"型番\": \"...\", \"製造年\": \"...\", \"定格冷房能力\": \"...\", \
\"定格暖房能力\": {\"標準\": \"...\", \"低温\": \"...\"}, \
\"定格冷房消費電力\": \"...\", \"定格暖房消費電力\": \"...\"}";

/// MIME type of the image payload.
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";
