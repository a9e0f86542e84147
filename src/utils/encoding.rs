use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::models::RenderedChart;

/// Encode a rendered chart's PNG bytes for inline embedding
pub fn encode_chart(chart: &RenderedChart) -> String {
    BASE64.encode(&chart.png)
}

/// `data:` URI form of an encoded chart, as used in `<img src>`
pub fn data_uri(encoded: &str) -> String {
    format!("data:image/png;base64,{}", encoded)
}
