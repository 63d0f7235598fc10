use dioxus::prelude::*;

/// Public page shell.
#[allow(non_snake_case)]
#[component]
pub fn Layout(title: String, children: Element) -> Element {
    let full_title = format!("{title} | Modern Slavery Registry");
    rsx! {
        head {
            meta { charset: "utf-8" }
            meta { name: "viewport", content: "width=device-width, initial-scale=1" }
            title { "{full_title}" }
            script { src: "https://cdn.tailwindcss.com" }
        }
        body { class: "min-h-screen bg-gray-50 font-sans text-gray-900",
            header { class: "bg-gray-900 text-white",
                div { class: "max-w-5xl mx-auto px-6 py-4 flex items-center justify-between",
                    a { href: "/explore", class: "text-lg font-semibold text-white no-underline",
                        "Modern Slavery Registry"
                    }
                }
            }
            main { class: "max-w-5xl mx-auto p-6",
                {children}
            }
        }
    }
}
