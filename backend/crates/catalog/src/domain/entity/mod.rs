mod category;
mod product;
mod review;
mod vendor;

pub use category::Category;
pub use product::{NewProduct, Product, ProductStatus, StoredFile};
pub use review::{Review, RatingSummary};
pub use vendor::{BankDetails, Vendor, VendorStatus};
