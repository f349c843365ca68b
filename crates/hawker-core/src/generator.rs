//! Pitch-text generation — product + task parameters → colloquial
//! Chinese sales copy.
//!
//! Everything here is pure: the only nondeterminism is the uniform
//! random pick of opening / trait / advice / closing phrases, and the
//! caller-supplied hour. [`generate_pitch`] wires in the wall clock and
//! a thread-local RNG; tests drive [`generate_pitch_with`] with a seeded
//! RNG and a pinned hour.

use chrono::Timelike;
use rand::Rng;

use crate::domain::{HawkingMode, HawkingTask, Product};

const OPENINGS: [&str; 5] = [
    "快来看啊，",
    "各位街坊邻居，",
    "新鲜到货了！",
    "瞧一瞧看一看，",
    "买好肉找咱家，",
];

const CLOSINGS: [&str; 4] = [
    "快来带一点！",
    "先到先得啊！",
    "晚了就卖光了！",
    "欢迎选购！",
];

/// Keyword → selling-point phrases. Checked against the product name
/// and the category name; the first containing keyword wins.
const TRAITS: [(&str, &[&str]); 8] = [
    (
        "猪肉",
        &[
            "本地黑猪肉，当天现宰，",
            "肥膘少、瘦肉多，",
            "肉色红润，没打过水的，",
            "这一块肉看着就舒坦，",
        ],
    ),
    (
        "牛肉",
        &[
            "鲜嫩黄牛肉，不打水不压秤，",
            "纹路漂亮，拿回家怎么炒都不老，",
            "现切的腱子肉，炖着吃最香，",
            "正宗黄牛肉，",
            "纹路清晰可见，",
            "肉质紧实，",
            "口感扎实，",
        ],
    ),
    (
        "五花",
        &[
            "三层五花，肥瘦均匀，",
            "这层色，做红烧肉简直绝了，",
            "肥的不腻，瘦的不柴，",
        ],
    ),
    (
        "排骨",
        &[
            "全是精选小排，不带大脊骨，",
            "骨头小、肉厚实，",
            "回家糖醋或者炖汤都行，",
            "排骨匀称，",
            "肉厚骨头小，",
            "全是精排小排，",
        ],
    ),
    ("瘦肉", &["纯瘦里脊，", "一点肥膘不带，", "肉质鲜嫩，"]),
    (
        "禽类",
        &[
            "农家土鸡土鸭，炖汤一层油，",
            "肉质紧实，不是那种饲料鸡，",
            "现杀现卖，新鲜看得见，",
        ],
    ),
    (
        "副产",
        &[
            "洗得干干净净，回家直接下锅，",
            "新鲜的猪肝猪心，补铁补血最好了，",
            "没味儿，拿回家随便炒炒都好吃，",
        ],
    ),
    ("羊肉", &["正宗山羊肉，一点不膻，", "冬天炖个萝卜，热乎乎的太补了，"]),
];

/// Keyword → cooking advice. Only the product name is checked and there
/// is no fallback phrase.
const ADVICES: [(&str, &[&str]); 5] = [
    (
        "五花",
        &[
            "做个扣肉或者红烧肉，全家都爱吃！",
            "切片煸个油，炒青菜香死个人！",
            "红烧、小炒都喷香！",
            "做个红烧肉全家抢着吃！",
        ],
    ),
    (
        "瘦肉",
        &[
            "切个肉丝炒辣椒，那是绝配！",
            "剁碎了包饺子，汁水特别多！",
            "包饺子、做肉丸最合适！",
            "给小朋友炒肉丝特别嫩！",
        ],
    ),
    (
        "排骨",
        &[
            "炖个冬瓜汤，清甜又好喝！",
            "炸个排骨，小孩能抢着吃完！",
            "炖个汤、做个糖醋那是绝了！",
            "清炖红烧都好吃！",
        ],
    ),
    (
        "牛肉",
        &[
            "逆着纹路切，炒出来比豆腐还嫩！",
            "加点土豆块，焖一锅全家香！",
        ],
    ),
    ("大肠", &["配点尖椒一爆炒，下酒神器啊！", "卤着吃更香，越嚼越有味儿！"]),
];

/// Generate the pitch for a task using the wall clock and a
/// thread-local RNG.
pub fn generate_pitch(product: &Product, task: &HawkingTask) -> String {
    let hour = chrono::Local::now().hour();
    generate_pitch_with(product, task, hour, &mut rand::thread_rng())
}

/// Deterministic entry point: `hour` and `rng` are injected.
pub fn generate_pitch_with<R: Rng + ?Sized>(
    product: &Product,
    task: &HawkingTask,
    hour: u32,
    rng: &mut R,
) -> String {
    let oral = oral_price(task.price, &task.unit);
    // Only quote the original price when it genuinely undercuts it.
    let oral_original = if task.original_price > task.price {
        Some(oral_price(task.original_price, &task.unit))
    } else {
        None
    };

    let time_context = if hour >= 17 { "晚上" } else { "今天" };

    if task.use_repeat_mode {
        let label = product
            .marketing_label
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or("新鲜的");
        let promo = non_empty_or(&task.promotion_tag, "活动价");

        // Twin-beat template: quote, re-introduce, then close with the
        // promotion price. The original-price clause only appears when
        // there is a real discount to contrast against.
        return match oral_original {
            Some(orig) => format!(
                "{} {}，{}{}，平时都要卖 {}，{}{} 只要 {}！",
                product.name, oral, label, product.name, orig, time_context, promo, oral
            ),
            None => format!(
                "{} {}，{}{}，{}{} 只要 {}！",
                product.name, oral, label, product.name, time_context, promo, oral
            ),
        };
    }

    smart_pitch(product, task, &oral, oral_original.as_deref(), rng)
}

/// Smart mode: opening + trait + "咱家的{name}，" + advice? + price + closing.
fn smart_pitch<R: Rng + ?Sized>(
    product: &Product,
    task: &HawkingTask,
    oral: &str,
    oral_original: Option<&str>,
    rng: &mut R,
) -> String {
    let mut script = String::from(OPENINGS[rng.gen_range(0..OPENINGS.len())]);

    let trait_phrase = TRAITS
        .iter()
        .find(|(key, _)| {
            product.name.contains(key)
                || (!product.category_name.is_empty() && product.category_name.contains(key))
        })
        .map(|(_, phrases)| phrases[rng.gen_range(0..phrases.len())]);
    script.push_str(trait_phrase.unwrap_or("优质生鲜，品质看得见，"));

    script.push_str(&format!("咱家的{}，", product.name));

    if let Some((_, phrases)) = ADVICES.iter().find(|(key, _)| product.name.contains(key)) {
        script.push_str(phrases[rng.gen_range(0..phrases.len())]);
    }

    let promo = non_empty_or(&task.promotion_tag, "今天搞活动");
    match oral_original {
        Some(orig) => {
            script.push_str(&format!("平时都要卖 {}，现在{}，只要 {}！", orig, promo, oral));
        }
        None => {
            script.push_str(&format!("现在{}，只要 {}！", promo, oral));
        }
    }

    if product.hawking_mode == HawkingMode::LowStock {
        script.push_str("最后最后一点了，便宜处理！");
    } else {
        script.push_str(CLOSINGS[rng.gen_range(0..CLOSINGS.len())]);
    }

    script
}

/// Convert a price and unit into colloquial Chinese.
///
/// The +0.5 before truncation pulls values like 19.9 (stored as
/// 19.89999…) back onto the right fen count.
pub fn oral_price(price: f64, unit: &str) -> String {
    if price <= 0.0 {
        return "价格面议".to_owned();
    }

    let total_fen = (price * 100.0 + 0.5) as i64;
    let yuan = total_fen / 100;
    let jiao = (total_fen % 100) / 10;
    let fen = total_fen % 10;

    let mut oral = format!("{yuan}块");
    if jiao > 0 && fen > 0 {
        // 11.99 -> 11块9毛9
        oral.push_str(&format!("{jiao}毛{fen}"));
    } else if jiao > 0 {
        // 11.9 -> 11块9, spoken form drops the "毛"
        oral.push_str(&format!("{jiao}"));
    } else if fen > 0 {
        // 11.05 -> 11块零5分
        oral.push_str(&format!("零{fen}分"));
    }

    if unit.is_empty() {
        return oral;
    }

    if unit.chars().any(|c| c.is_ascii_digit()) {
        // 10块钱3个
        format!("{oral}钱{unit}")
    } else {
        // 9块9一斤
        format!("{oral}一{unit}")
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}
