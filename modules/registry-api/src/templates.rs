use dioxus::prelude::VirtualDom;

const DOCTYPE: &str = "<!DOCTYPE html>";

/// Render a rebuilt VirtualDom as a full HTML document.
pub fn render_document(dom: &VirtualDom) -> String {
    let body = dioxus::ssr::render(dom);
    let mut html = String::with_capacity(DOCTYPE.len() + body.len() + 32);
    html.push_str(DOCTYPE);
    html.push_str("<html lang=\"en-GB\">");
    html.push_str(&body);
    html.push_str("</html>");
    html
}
