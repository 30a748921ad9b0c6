use serde::Serialize;

use crate::models::GenerationMode;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StylePreset {
    pub id: &'static str,
    pub name: &'static str,
    pub prompt: &'static str,
    pub description: &'static str,
}

const fn preset(id: &'static str, name: &'static str, prompt: &'static str, description: &'static str) -> StylePreset {
    StylePreset { id, name, prompt, description }
}

pub const PHOTOSHOOT_THEMES: &[&str] = &[
    "Editorial Fashion Campaign",
    "Lifestyle Lookbook Story",
    "Streetwear Drop",
    "Luxury Brand Launch",
    "Resort Vacation Collection",
    "Festival Capsule Collection",
    "Athleisure Performance Series",
    "Romantic Vintage Story",
    "Futuristic Cyber Showcase",
    "Art Gallery Presentation",
];

pub const LIGHTING_STYLES: &[&str] = &[
    "Soft Diffused Daylight",
    "Golden Hour Sunbeams",
    "Moody Dramatic Shadows",
    "Color Gel Studio Lights",
    "Cinematic Rim Lighting",
    "Neon Backlit Glow",
    "High Key Flash",
    "Low Key Spotlight",
    "Natural Window Light",
    "Overcast Ambient Haze",
];

pub const LOOKBOOK_STYLE_PRESETS: &[StylePreset] = &[
    preset("interior-scandi", "Interior Skandinavia", "Bright Scandinavian living room with natural wood, indoor plants, and large windows flooding the space with daylight.", "Bright airy apartment with Scandinavian decor."),
    preset("rooftop-night", "Rooftop Bar", "Urban rooftop lounge at night with city skyline bokeh, string lights, and wet pavement reflections for cinematic energy.", "Nighttime city rooftop with moody lighting."),
    preset("tokyo-street", "Jalanan Tokyo", "Neon-lit Tokyo street after rain, glowing signage, wet asphalt reflections, and atmospheric steam for a vibrant night scene.", "Electric downtown street with neon glow."),
    preset("lux-apartment", "Apartemen Mewah", "Sophisticated penthouse interior with designer furniture, large glass windows, and polished marble finishes.", "High-end apartment setting with luxury details."),
    preset("tropical-beach", "Pantai Tropis", "Sun-drenched tropical beach boardwalk with palm trees, soft sand, and bright blue ocean backdrop.", "Warm coastal vibe with palm trees and sun."),
    preset("autumn-park", "Taman Musim Gugur", "Outdoor park filled with golden autumn foliage, scattered leaves, and warm soft sunlight filtering through trees.", "Golden fall park with layered leaves."),
    preset("heritage-architecture", "Gedung Tua", "Historic architecture with textured walls, arched windows, and vintage props for timeless storytelling.", "Classic heritage building exterior/interior."),
    preset("aesthetic-cafe", "Kafe Estetik", "Minimal cafe interior with terrazzo counters, latte art, soft daylight, and curated lifestyle props.", "Chic coffee shop mood with lifestyle props."),
    preset("flower-garden", "Taman Bunga", "Lush botanical garden with blooming flowers, soft petals in foreground, and dreamy natural light.", "Romantic floral garden environment."),
    preset("studio-minimal", "Studio Minimalis", "Editorial studio with seamless backdrop, sculptural props, and controlled lighting for a clean modern look.", "High-fashion studio with minimal set design."),
    preset("misty-forest", "Hutan Berkabut", "Moody forest clearing with soft fog, diffused light beams, and lush greenery for cinematic atmosphere.", "Foggy woodland scene with depth."),
    preset("runway-glam", "Runway Fashion", "High-fashion runway with spotlighting, glossy floor reflections, and audience bokeh for catwalk energy.", "Bold runway moment with dramatic lights."),
    preset("urban-night", "Gaya Urban (Malam)", "Moody city streets at night with reflective wet ground, neon signage, and cinematic rim light around the subject.", "Urban night walk vibes with neon highlights."),
    preset("classic-library", "Perpustakaan Klasik", "Vintage library with wooden shelves, warm sconces, and book stacks providing intellectual charm.", "Classic library interior with warm ambience."),
    preset("scenic-studio", "Studio Geometris", "Contemporary studio with geometric plinths, arches, and soft-edge shadows for editorial portraits.", "Architectural studio set for people shots."),
];

pub const BROLL_STYLE_PRESETS: &[StylePreset] = &[
    preset("studio-minimal", "Studio Minimalis", "Clean studio set with soft gradient backdrop, subtle shadows, and floating pedestal to spotlight the product.", "Minimal seamless background with gentle gradient."),
    preset("rustic-wood", "Meja Kayu Rustic", "Weathered wooden tabletop with warm tones, natural light streaks, and organic props like dried leaves and twigs.", "Warm wooden surface with rustic props."),
    preset("metal-glass", "Refleksi Logam & Kaca", "Mirror-polished metal and glass surfaces creating crisp reflections and futuristic highlights.", "Sleek reflective set with chrome and glass."),
    preset("calm-water", "Permukaan Air Tenang", "Shallow water surface with gentle ripples, soft spotlighting, and floating mist for a serene effect.", "Glossy water reflections with tranquil mood."),
    preset("soft-gradient", "Latar Gradien Halus", "Subtle pastel gradient background with airy particles and diffused lighting for a dreamy aesthetic.", "Pastel gradient backdrop with soft glow."),
    preset("desert-dramatic", "Gurun Pasir Dramatis", "Textured desert sand dunes, directional light, and heat haze for adventurous storytelling.", "Sunlit desert environment with strong shadows."),
    preset("moss-stones", "Taman Lumut & Batu", "Lush moss, smooth river stones, and gentle mist create a fresh rainforest micro world.", "Green mini-ecosystem with mossy stones."),
    preset("industrial-concrete", "Beton Industrial", "Raw concrete surfaces, moody rim lighting, and minimal metal props for an industrial aesthetic.", "Industrial concrete textures and hard light."),
    preset("neon-stage", "Panggung Neon Tokyo", "Neon floor panels, glowing tubes, and misty atmosphere inspired by futuristic Tokyo nightlife.", "Vibrant neon stage with backlit glow."),
    preset("lux-silk", "Sutra & Satin Mewah", "Flowing silk and satin drapery with specular highlights and spotlight to convey luxury.", "Elegant folded fabrics with soft highlights."),
    preset("geometric-solid", "Bentuk Geometris", "Bold geometric blocks, layered shapes, and dramatic shadows creating strong graphic composition.", "Architectural shapes supporting the hero product."),
    preset("paper-art", "Lipatan Kertas Artistik", "Layered paper sculptures, folded shapes, and directional lighting for an artsy handcrafted feel.", "Paper craft stage with sculpted folds."),
    preset("marble-lux", "Meja Marmer Mewah", "Polished white marble tabletop with subtle veining, soft top light, and elegant gold accents.", "Luxury marble surface with premium feel."),
    preset("dark-texture", "Latar Gelap Bertekstur", "Deep charcoal textured backdrop with controlled pools of light and soft haze for drama.", "Dark textured background with moody light."),
    preset("stone-leaves", "Batu Alam & Daun Segar", "Natural slate stones with fresh green leaves, dewdrops, and directional sunlight highlights.", "Fresh organic set with stones and leaves."),
    preset("scandi-counter", "Dapur Modern", "Modern Scandinavian kitchen counter with matte surfaces, soft daylight, and lifestyle props.", "Clean kitchen counter scene for products."),
    preset("classic-library-prop", "Perpustakaan Klasik", "Mahogany desk with stacked books, warm lamp glow, and soft dust particles in the air.", "Classic library desk for premium goods."),
];

pub const LOOKBOOK_VARIATION_FOCUS: &[&str] = &[
    "Full-body portrait showcasing the entire outfit in context.",
    "Dynamic walking pose captured mid-motion with energy.",
    "Seated lifestyle pose interacting naturally with the environment.",
    "Half-body close-up highlighting garment details and textures.",
    "Candid moment with the model looking away or adjusting the outfit.",
    "Editorial pose with expressive gesture and dramatic composition.",
    "Leaning against a wall with shallow depth-of-field city bokeh.",
    "Three-quarter turn showcasing silhouette and garment fit.",
];

pub const BROLL_VARIATION_FOCUS: &[&str] = &[
    "Front-facing hero shot with the product centered and powerful.",
    "Three-quarter angle emphasizing depth and dimensional highlights.",
    "Macro close-up revealing fine surface textures and key features.",
    "Flat-lay arrangement with complementary props framing the product.",
    "Low-angle perspective that makes the product feel bold and iconic.",
    "Creative motion-inspired setup with dynamic lighting or particles.",
    "Backlit silhouette with glow outlining the product shape.",
    "Reflection composition using mirrors, glass, or glossy surfaces.",
];
pub const PROFILE_VARIATION_FOCUS: &[&str] = &[
    "Direct eye contact with a confident, approachable expression.",
    "Slight head tilt with a relaxed, natural smile.",
    "Three-quarter angle with soft background separation.",
    "Candid look just off camera, caught between moments.",
    "Chin slightly raised with a composed, assured posture.",
    "Warm expression framed by gentle environmental context.",
];

pub const SKINCARE_STYLE_PRESETS: &[StylePreset] = &[
    preset("serum-application", "Serum Application", "Model applying skincare serum with gentle massage motions, clean bathroom setting", "Serum routine in a clean bathroom."),
    preset("moisturizer-routine", "Moisturizer Routine", "Model applying moisturizer with upward strokes, natural lighting", "Daily moisturizing in soft daylight."),
    preset("mask-treatment", "Mask Treatment", "Model wearing face mask, relaxing spa-like environment", "Spa-style mask treatment."),
    preset("cleansing-routine", "Cleansing Routine", "Model cleansing face with gentle circular motions, fresh clean look", "Fresh cleansing moment."),
    preset("eye-care", "Eye Care", "Model applying eye cream with delicate patting motions, focused lighting", "Close eye-care application."),
    preset("sun-protection", "Sun Protection", "Model applying sunscreen, outdoor natural lighting", "Sunscreen outdoors."),
];

pub const HOUSEHOLD_STYLE_PRESETS: &[StylePreset] = &[
    preset("kitchen-use", "Kitchen Use", "Person actively using household product in modern kitchen setting, holding and demonstrating the product, natural home lighting", "Hands-on demo in a modern kitchen."),
    preset("cleaning-routine", "Cleaning Routine", "Person demonstrating cleaning product in home environment, showing how to use the product effectively", "Cleaning demo at home."),
    preset("living-room", "Living Room", "Person using household product in cozy living room setting, interacting with the product naturally", "Cozy living room usage."),
    preset("bathroom", "Bathroom", "Person using household product in clean bathroom setting, showing practical usage", "Practical bathroom usage."),
    preset("outdoor-use", "Outdoor Use", "Person using household product in outdoor/garden setting, demonstrating outdoor functionality", "Garden and outdoor usage."),
    preset("storage-organization", "Storage & Organization", "Person organizing with household product, showing storage and organization solutions", "Storage and tidying solutions."),
];

pub const MOTORCYCLE_STYLE_PRESETS: &[StylePreset] = &[
    preset("urban-riding", "Urban Riding", "Model riding motorcycle in urban city setting with modern backdrop", "City riding with a modern backdrop."),
    preset("highway-cruising", "Highway Cruising", "Model on motorcycle on open highway with scenic views", "Open highway cruise."),
    preset("off-road-adventure", "Off-Road Adventure", "Model on motorcycle in rugged off-road terrain and nature", "Rugged off-road terrain."),
    preset("racing-track", "Racing Track", "Model on motorcycle at racing track with professional racing environment", "Race track energy."),
    preset("coastal-ride", "Coastal Ride", "Model on motorcycle along coastal roads with ocean views", "Coastal road with ocean views."),
    preset("mountain-touring", "Mountain Touring", "Model on motorcycle in mountain landscapes with scenic routes", "Scenic mountain routes."),
];

pub const THEME_STYLE_PRESETS: &[StylePreset] = &[
    preset("minimalist", "Minimalist", "Clean minimalist theme with simple lines and neutral colors", "Simple lines, neutral palette."),
    preset("vintage", "Vintage", "Vintage retro theme with classic styling and warm tones", "Retro styling in warm tones."),
    preset("modern", "Modern", "Contemporary modern theme with sleek design elements", "Sleek contemporary design."),
    preset("bohemian", "Bohemian", "Bohemian theme with eclectic patterns and vibrant colors", "Eclectic vibrant patterns."),
    preset("industrial", "Industrial", "Industrial theme with raw materials and urban aesthetics", "Raw urban materials."),
    preset("scandinavian", "Scandinavian", "Scandinavian theme with light woods and cozy elements", "Light woods, cozy details."),
    preset("tropical", "Tropical", "Tropical theme with lush greenery and vibrant colors", "Lush greenery."),
    preset("rustic", "Rustic", "Rustic theme with natural materials and earthy tones", "Natural earthy materials."),
];

pub const TRY_ON_STYLE_PRESETS: &[StylePreset] = &[
    preset("fashion-photography", "Professional Fashion Photography", "Clean professional fashion photography set showing the outfit as it looks when worn", "Studio try-on shot."),
];

pub const VOICE_OVER_STYLES: &[StylePreset] = &[
    preset("fashion-elegant", "Fashion Elegant", "Generate elegant fashion voice over narrative focusing on style, comfort, and sophistication", "Stylish and refined."),
    preset("beauty-luxury", "Beauty Luxury", "Create luxurious beauty product voice over emphasizing premium quality and results", "Premium beauty copy."),
    preset("lifestyle-casual", "Lifestyle Casual", "Generate casual lifestyle voice over highlighting comfort and everyday usability", "Everyday lifestyle copy."),
    preset("food-appetizing", "Food Appetizing", "Create appetizing food voice over focusing on taste, freshness, and dining experience", "Taste and freshness."),
    preset("tech-innovative", "Tech Innovative", "Generate innovative tech product voice over emphasizing features and cutting-edge technology", "Features and innovation."),
    preset("home-cozy", "Home Cozy", "Create cozy home product voice over highlighting comfort, warmth, and family moments", "Warm family moments."),
];

/// How a composite-subject mode frames its shoot: who the editor is, what the
/// person does with the product, and the scene used when no preset is named.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FeatureStrategy {
    pub mode: GenerationMode,
    pub name: &'static str,
    pub role: &'static str,
    pub product_noun: &'static str,
    pub theme: Option<&'static str>,
    pub lighting: Option<&'static str>,
    pub presets: &'static [StylePreset],
}

pub const FEATURE_STRATEGIES: &[FeatureStrategy] = &[
    FeatureStrategy {
        mode: GenerationMode::Lookbook,
        name: "Lookbook",
        role: "You are a professional fashion photoshoot editor. Your task is to place the person from the first input image into a new setting, wearing the clothes from the second input image.",
        product_noun: "the clothing/accessory",
        theme: None,
        lighting: None,
        presets: LOOKBOOK_STYLE_PRESETS,
    },
    FeatureStrategy {
        mode: GenerationMode::VirtualTryOn,
        name: "Virtual Try-On",
        role: "You are a professional virtual try-on stylist. Your task is to show the person from the first input image wearing the clothing item from the second input image, exactly as it would look when worn.",
        product_noun: "the clothing item",
        theme: Some("Professional Fashion Photography"),
        lighting: Some("Professional Studio Lighting"),
        presets: TRY_ON_STYLE_PRESETS,
    },
    FeatureStrategy {
        mode: GenerationMode::SkincareApplication,
        name: "Skincare Applicator",
        role: "You are a professional beauty campaign photographer. Your task is to show the person from the first input image applying or using the skincare product from the second input image.",
        product_noun: "the skincare product and its packaging",
        theme: Some("Skincare Application"),
        lighting: Some("Natural Soft Lighting"),
        presets: SKINCARE_STYLE_PRESETS,
    },
    FeatureStrategy {
        mode: GenerationMode::HouseholdProducts,
        name: "Household Products",
        role: "You are a professional home lifestyle photographer. Your task is to show the person from the first input image holding and demonstrating the household product from the second input image.",
        product_noun: "the household product",
        theme: Some("Household Product Demonstration"),
        lighting: Some("Natural Home Lighting"),
        presets: HOUSEHOLD_STYLE_PRESETS,
    },
    FeatureStrategy {
        mode: GenerationMode::MotorcycleProducts,
        name: "Motorcycle Products",
        role: "You are a professional automotive lifestyle photographer. Your task is to show the person from the first input image riding or posing with the motorcycle product from the second input image.",
        product_noun: "the motorcycle product",
        theme: Some("Motorcycle Product Showcase"),
        lighting: Some("Dynamic Outdoor Lighting"),
        presets: MOTORCYCLE_STYLE_PRESETS,
    },
    FeatureStrategy {
        mode: GenerationMode::CustomizeTheme,
        name: "Customize Theme",
        role: "You are a professional creative director. Your task is to place the person from the first input image, wearing or holding the product from the second input image, into a fully themed set.",
        product_noun: "the product",
        theme: Some("Theme Customization"),
        lighting: Some("Professional Studio Lighting"),
        presets: THEME_STYLE_PRESETS,
    },
];

/// Composite-subject strategy for a mode; `None` for b-roll and profile pictures.
pub fn feature_strategy(mode: GenerationMode) -> Option<&'static FeatureStrategy> {
    FEATURE_STRATEGIES.iter().find(|f| f.mode == mode)
}

pub fn find_voice_over_style(id: &str) -> Option<&'static StylePreset> {
    VOICE_OVER_STYLES.iter().find(|p| p.id == id)
}

/// Looks a preset up in the mode's own catalogue. Lookbook, b-roll and profile
/// pictures also fall back to each other's lists; ids are only unique per catalogue.
pub fn find_preset(mode: GenerationMode, id: &str) -> Option<&'static StylePreset> {
    let (own, other) = match mode {
        GenerationMode::Broll => (BROLL_STYLE_PRESETS, LOOKBOOK_STYLE_PRESETS),
        GenerationMode::Lookbook | GenerationMode::ProfilePicture => (LOOKBOOK_STYLE_PRESETS, BROLL_STYLE_PRESETS),
        category => (feature_strategy(category).map(|f| f.presets).unwrap_or(&[]), &[][..]),
    };
    own.iter().chain(other.iter()).find(|p| p.id == id)
}

/// Focus line for a 1-based variant index, cycling through the mode's list.
pub fn variation_focus(mode: GenerationMode, variant: usize) -> &'static str {
    let focus = match mode {
        GenerationMode::Broll => BROLL_VARIATION_FOCUS,
        GenerationMode::ProfilePicture => PROFILE_VARIATION_FOCUS,
        _ => LOOKBOOK_VARIATION_FOCUS,
    };
    focus[variant.saturating_sub(1) % focus.len()]
}

#[derive(Debug, Serialize)]
pub struct Catalogue {
    pub themes: &'static [&'static str],
    pub lighting: &'static [&'static str],
    pub lookbook_presets: &'static [StylePreset],
    pub broll_presets: &'static [StylePreset],
    pub features: &'static [FeatureStrategy],
    pub voice_over_styles: &'static [StylePreset],
}

pub fn catalogue() -> Catalogue {
    Catalogue {
        themes: PHOTOSHOOT_THEMES,
        lighting: LIGHTING_STYLES,
        lookbook_presets: LOOKBOOK_STYLE_PRESETS,
        broll_presets: BROLL_STYLE_PRESETS,
        features: FEATURE_STRATEGIES,
        voice_over_styles: VOICE_OVER_STYLES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_ids_resolve_per_mode() {
        let lookbook = find_preset(GenerationMode::Lookbook, "studio-minimal").unwrap();
        let broll = find_preset(GenerationMode::Broll, "studio-minimal").unwrap();
        assert_ne!(lookbook.prompt, broll.prompt);
        assert!(broll.prompt.contains("floating pedestal"));
    }

    #[test]
    fn falls_back_to_other_catalogue() {
        let found = find_preset(GenerationMode::Lookbook, "marble-lux").unwrap();
        assert_eq!(found.name, "Meja Marmer Mewah");
        assert!(find_preset(GenerationMode::Broll, "does-not-exist").is_none());
    }

    #[test]
    fn variation_focus_cycles() {
        let n = LOOKBOOK_VARIATION_FOCUS.len();
        assert_eq!(variation_focus(GenerationMode::Lookbook, 1), LOOKBOOK_VARIATION_FOCUS[0]);
        assert_eq!(variation_focus(GenerationMode::Lookbook, n + 1), LOOKBOOK_VARIATION_FOCUS[0]);
        assert_ne!(variation_focus(GenerationMode::Broll, 1), variation_focus(GenerationMode::Broll, 2));
    }

    #[test]
    fn category_presets_stay_in_their_own_catalogue() {
        let serum = find_preset(GenerationMode::SkincareApplication, "serum-application").unwrap();
        assert!(serum.prompt.contains("skincare serum"));
        assert!(find_preset(GenerationMode::SkincareApplication, "tokyo-street").is_none());
        assert!(find_preset(GenerationMode::Lookbook, "serum-application").is_none());
        assert_eq!(find_preset(GenerationMode::MotorcycleProducts, "coastal-ride").unwrap().name, "Coastal Ride");
    }

    #[test]
    fn every_subject_mode_has_a_strategy() {
        for mode in [
            GenerationMode::Lookbook,
            GenerationMode::VirtualTryOn,
            GenerationMode::SkincareApplication,
            GenerationMode::HouseholdProducts,
            GenerationMode::MotorcycleProducts,
            GenerationMode::CustomizeTheme,
        ] {
            let strategy = feature_strategy(mode).unwrap();
            assert!(mode.needs_subject());
            assert!(!strategy.presets.is_empty(), "{:?}", mode);
        }
        assert!(feature_strategy(GenerationMode::Broll).is_none());
        assert_eq!(catalogue().voice_over_styles.len(), 6);
        assert_eq!(find_voice_over_style("home-cozy").unwrap().name, "Home Cozy");
    }
}
