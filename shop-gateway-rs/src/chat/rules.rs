//! Rule-based replies
//!
//! An ordered keyword table over the lowercased message. Keywords match as
//! plain substrings, so "hi" inside "shipping" is still a greeting. The first
//! rule with a matching keyword answers; nothing matching gets [`DEFAULT_REPLY`].

pub const GREETING_REPLY: &str = "Hello! How can I assist with your shopping today?";
pub const PRICE_REPLY: &str = "Our prices are very competitive. Which product are you interested in?";
pub const SHIPPING_REPLY: &str =
    "We offer free shipping on orders over $50. Delivery usually takes 3-5 business days.";
pub const RETURNS_REPLY: &str = "We have a 30-day return policy. Items must be unused and in original packaging.";
pub const ELECTRONICS_REPLY: &str = "We have a great selection of electronics including laptops, smartphones, and accessories. Check out our electronics category!";
pub const CLOTHING_REPLY: &str =
    "We offer a variety of men's and women's clothing. Is there a specific type you're looking for?";
pub const JEWELRY_REPLY: &str =
    "Our jewelry collection includes rings, necklaces, earrings, and more. All made with high-quality materials.";
pub const DEFAULT_REPLY: &str = "I'm here to help with your shopping needs!";

struct Rule {
    name: &'static str,
    keywords: &'static [&'static str],
    reply: &'static str,
}

// Order is priority.
const RULES: &[Rule] = &[
    Rule {
        name: "greeting",
        keywords: &["hello", "hi"],
        reply: GREETING_REPLY,
    },
    Rule {
        name: "price",
        keywords: &["price", "cost"],
        reply: PRICE_REPLY,
    },
    Rule {
        name: "shipping",
        keywords: &["shipping", "delivery"],
        reply: SHIPPING_REPLY,
    },
    Rule {
        name: "returns",
        keywords: &["return", "exchange"],
        reply: RETURNS_REPLY,
    },
    Rule {
        name: "electronics",
        keywords: &["electronics"],
        reply: ELECTRONICS_REPLY,
    },
    Rule {
        name: "clothing",
        keywords: &["clothing", "clothes"],
        reply: CLOTHING_REPLY,
    },
    Rule {
        name: "jewelry",
        keywords: &["jewelry"],
        reply: JEWELRY_REPLY,
    },
];

impl Rule {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|keyword| lowered.contains(keyword))
    }
}

/// Name of the first matching rule, or `"default"`
pub fn classify(message: &str) -> &'static str {
    let lowered = message.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map_or("default", |rule| rule.name)
}

/// Canned reply for `message`
pub fn fallback_reply(message: &str) -> &'static str {
    let lowered = message.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map_or(DEFAULT_REPLY, |rule| rule.reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_rule() {
        assert_eq!(fallback_reply("hello there"), GREETING_REPLY);
        assert_eq!(fallback_reply("Hi!"), GREETING_REPLY);
        assert_eq!(fallback_reply("How much does it cost?"), PRICE_REPLY);
        assert_eq!(fallback_reply("When is DELIVERY?"), SHIPPING_REPLY);
        assert_eq!(fallback_reply("What's your return policy?"), RETURNS_REPLY);
        assert_eq!(fallback_reply("Can I exchange a jacket"), RETURNS_REPLY);
        assert_eq!(fallback_reply("show me electronics"), ELECTRONICS_REPLY);
        assert_eq!(fallback_reply("new clothes"), CLOTHING_REPLY);
        assert_eq!(fallback_reply("any jewelry?"), JEWELRY_REPLY);
        assert_eq!(fallback_reply("tell me a joke"), DEFAULT_REPLY);
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(fallback_reply("hello, what is the price of shipping?"), GREETING_REPLY);
        assert_eq!(fallback_reply("price of delivery"), PRICE_REPLY);
        assert_eq!(fallback_reply("return the electronics"), RETURNS_REPLY);
        assert_eq!(classify("clothes and jewelry"), "clothing");
    }

    #[test]
    fn test_keywords_match_inside_words() {
        // "shipping" and "this" contain "hi"
        assert_eq!(fallback_reply("is shipping free?"), GREETING_REPLY);
        assert_eq!(fallback_reply("this jewelry"), GREETING_REPLY);
        assert_eq!(classify("hi-fi electronics"), "greeting");
        assert_eq!(classify("low-cost exchange"), "price");
        assert_eq!(fallback_reply("returned item"), RETURNS_REPLY);
    }

    #[test]
    fn test_deterministic() {
        for _ in 0..10 {
            assert_eq!(fallback_reply("hello there"), GREETING_REPLY);
        }
    }
}
