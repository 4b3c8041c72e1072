//! Prompt 模板与拼装
//!
//! 全部是纯函数：同样的输入永远得到同样的 prompt。
//! 辅导路由用通用模板；plan / exam / summarize / feedback
//! 各带任务模板，结构化任务要求模型只输出 JSON。

/// 辅导人设前导，所有辅导类 prompt 的第一段
const TUTOR_PERSONA: &str =
    "You are StudyBuddy, a friendly and patient AI tutor helping students learn.";

/// 固定的回答要求，放在 prompt 末尾
const TUTOR_GUIDANCE: &str = "Give a clear, educational answer. Use a concrete example \
where it helps understanding, and keep the tone encouraging.";

/// 通用辅导 prompt：人设 + 可选科目上下文 + 问题 + 回答要求
pub fn format_tutor_prompt(question: &str, context: Option<&str>) -> String {
    let mut prompt = String::from(TUTOR_PERSONA);
    prompt.push_str("\n\n");

    if let Some(context) = context {
        prompt.push_str(&format!("Subject context: {}\n\n", context));
    }

    prompt.push_str(&format!("Student question: {}\n\n", question));
    prompt.push_str(TUTOR_GUIDANCE);
    prompt
}

/// 学习计划 prompt，要求模型输出严格 JSON 数组
pub fn study_plan_prompt(
    subject: &str,
    goal: &str,
    days: u32,
    hours_per_day: Option<f32>,
) -> String {
    let hours_line = match hours_per_day {
        Some(hours) => format!("The student can study about {} hours per day.\n", hours),
        None => String::new(),
    };

    format!(
        "{persona}\n\n\
        Create a {days}-day study plan for the subject \"{subject}\".\n\
        The student's goal: {goal}\n\
        {hours_line}\
        Respond with a JSON array only, no prose and no markdown. Each element must be \
        an object with exactly these fields: \"day\" (number starting at 1), \"focus\" \
        (short description of the day's theme), \"tasks\" (array of 2-4 concrete task strings).",
        persona = TUTOR_PERSONA,
        days = days,
        subject = subject,
        goal = goal,
        hours_line = hours_line,
    )
}

/// 模拟测验 prompt，同样要求严格 JSON
pub fn practice_exam_prompt(subject: &str, topic: &str, count: u32, difficulty: &str) -> String {
    format!(
        "{persona}\n\n\
        Write {count} {difficulty} multiple-choice questions about \"{topic}\" in {subject}.\n\
        Respond with a JSON array only, no prose and no markdown. Each element must be an \
        object with exactly these fields: \"question\" (the question text), \"options\" \
        (array of exactly 4 answer strings), \"answer\" (the correct option, copied verbatim \
        from options), \"explanation\" (one or two sentences on why it is correct).",
        persona = TUTOR_PERSONA,
        count = count,
        difficulty = difficulty,
        topic = topic,
        subject = subject,
    )
}

/// 摘要 prompt，长度档位映射为明确的篇幅要求
pub fn summary_prompt(text: &str, length: &str) -> String {
    let length_hint = match length {
        "short" => "two or three sentences",
        "detailed" => "several paragraphs covering every key point",
        _ => "one concise paragraph",
    };

    format!(
        "{persona}\n\n\
        Summarize the following study material in {length_hint}. Focus on the concepts a \
        student needs to remember. Respond with the summary text only.\n\n\
        Material:\n{text}",
        persona = TUTOR_PERSONA,
        length_hint = length_hint,
        text = text,
    )
}

/// 作答点评 prompt，产出两三句短反馈
pub fn feedback_prompt(question: &str, answer: &str, subject: Option<&str>) -> String {
    let subject_line = match subject {
        Some(subject) => format!("Subject: {}\n", subject),
        None => String::new(),
    };

    format!(
        "{persona}\n\n\
        {subject_line}\
        A student answered a practice question. Give two or three sentences of constructive \
        feedback: what is right, what is missing or wrong, and one tip to improve. Respond \
        with the feedback text only.\n\n\
        Question: {question}\n\
        Student answer: {answer}",
        persona = TUTOR_PERSONA,
        subject_line = subject_line,
        question = question,
        answer = answer,
    )
}
