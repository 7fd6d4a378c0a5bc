//! Fixed system prompts and the diagnosis user prompt.

use crate::DiagnosisRequest;

/// Persona for the conversational cycle. Also tells the model to call
/// `amap_weather` with district-level locations.
pub const DEFAULT_SYSTEM_PROMPT: &str = "你是一位专业的医疗医生，知道一切的医学知识，同时你也可以获取实时天气信息。\
请以专业、简洁的口吻回答用户的问题，提供医学建议和指导。请直接开始回答，避免任何形式的寒暄或重复的问候。\
切记要专业，不要出现任何重复语言，只输出最后的答案。\
当用户问到天气相关问题时，你应该调用 `amap_weather` 工具来获取天气数据。\
在调用 `amap_weather` 工具时，`location` 参数请务必提供详细的区或县名称，例如\"海淀区\"、\"锦江区\"，\
而不是笼统的城市名如\"北京\"或\"成都\"。";

pub const DIAGNOSIS_SYSTEM_PROMPT: &str = r#"你是一位专业的医疗诊断助手。根据用户提供的症状、严重程度、持续时间和任何附加信息，请你进行详细的病情分析，并以严格的JSON格式输出结果。请确保JSON结构和内容严格符合以下定义，不要有任何额外文本、解释或格式错误。所有建议应专业、具体且实用。

JSON输出格式（所有字段必须包含）：
{
  "urgency_level": "string", // 紧急程度："高"（立即就医）、"中"（尽快就医）、"低"（可观察，必要时就医）
  "possible_diseases": [
    {"name": "string", "confidence": "float"} // 可能的疾病名称及其置信度（0.0-1.0）
  ],
  "recommended_departments": ["string"], // 推荐就诊科室列表
  "analysis": "string", // 对症状的详细医学分析
  "recommendations": {
    "immediate_actions": ["string"], // 立即采取的措施
    "lifestyle_advice": ["string"],  // 生活方式建议
    "when_to_see_doctor": ["string"], // 何时需要就医的指征
    "prevention_tips": ["string"]    // 预防建议
  }
}

请严格遵守JSON格式，不要输出任何Markdown格式，不要有任何前言或后语。"#;

pub fn diagnosis_user_prompt(request: &DiagnosisRequest) -> String {
    format!(
        "我的症状是：{}\n严重程度：{}\n持续时间：{}\n附加信息：{}\n\n请根据以上信息，输出详细的病情诊断，严格按照您被指示的JSON格式。",
        request.symptoms.join(", "),
        request.severity,
        request.duration,
        request.additional_info.as_deref().unwrap_or("无"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_lists_symptoms_and_defaults() {
        let request = DiagnosisRequest::new(vec!["头痛".to_string(), "发热".to_string()]);
        let prompt = diagnosis_user_prompt(&request);

        assert!(prompt.starts_with("我的症状是：头痛, 发热\n"));
        assert!(prompt.contains("严重程度：中等"));
        assert!(prompt.contains("持续时间：1-2天"));
        assert!(prompt.contains("附加信息：无"));
    }

    #[test]
    fn persona_mentions_weather_tool() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains("amap_weather"));
    }
}
