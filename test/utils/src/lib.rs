/// Partial values of a code fragment as a generation endpoint streams them,
/// one JSON object per line. Every line is the full value so far.
pub fn code_stream_fixture() -> &'static str {
    return r#"
{"commentary":"I'll build a sales chart"}
{"commentary":"I'll build a sales chart for your store.","template":"nextjs-developer"}
{"commentary":"I'll build a sales chart for your store.","template":"nextjs-developer","title":"Sales chart","file_path":"pages/index.tsx"}
{"commentary":"I'll build a sales chart for your store.","template":"nextjs-developer","title":"Sales chart","file_path":"pages/index.tsx","port":3000,"code":"export default function Home() {\n  return <h1>Sales</h1>;\n}"}
"#
    .trim();
}

/// The same stream framed as server-sent events, terminated by `[DONE]`.
pub fn sse_code_stream_fixture() -> String {
    let mut lines = code_stream_fixture()
        .lines()
        .map(|line| return format!("data: {line}\n"))
        .collect::<Vec<String>>();

    lines.push("data: [DONE]\n".to_string());
    return lines.join("\n");
}

pub fn code_stream_final_code() -> &'static str {
    return "export default function Home() {\n  return <h1>Sales</h1>;\n}";
}
